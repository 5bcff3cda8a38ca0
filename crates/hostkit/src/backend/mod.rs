//! Host tool backends: apt/dpkg for packages, systemd for services.

pub mod apt;
pub mod systemd;
