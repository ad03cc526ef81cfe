// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Name of the machine we are running on.

/// Resolves the current host name for the submit-host check.
pub trait HostResolver: Send + Sync {
    fn hostname(&self) -> std::io::Result<String>;
}

/// Real host name from `gethostname(2)`, unless an override is set.
#[derive(Debug, Clone, Default)]
pub struct SystemHost {
    override_name: Option<String>,
}

impl SystemHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report `name` instead of asking the kernel.
    pub fn with_override(name: Option<String>) -> Self {
        Self { override_name: name.filter(|n| !n.is_empty()) }
    }
}

impl HostResolver for SystemHost {
    fn hostname(&self) -> std::io::Result<String> {
        if let Some(name) = &self.override_name {
            return Ok(name.clone());
        }
        let name = nix::unistd::gethostname().map_err(std::io::Error::from)?;
        Ok(name.to_string_lossy().into_owned())
    }
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::HostResolver;

    /// Fixed host name; `None` simulates a lookup failure.
    #[derive(Debug, Clone)]
    pub struct FakeHost {
        name: Option<String>,
    }

    impl FakeHost {
        pub fn new(name: &str) -> Self {
            Self { name: Some(name.to_string()) }
        }

        pub fn failing() -> Self {
            Self { name: None }
        }
    }

    impl HostResolver for FakeHost {
        fn hostname(&self) -> std::io::Result<String> {
            self.name
                .clone()
                .ok_or_else(|| std::io::Error::other("hostname lookup failed"))
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeHost;
