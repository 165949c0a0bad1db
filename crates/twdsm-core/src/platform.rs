//! Per-target deployment of the Data Source Manager.
//!
//! Each target family gets its search policy at compile time. Only 32-bit
//! Windows still ships two DSM generations side by side; everywhere else
//! there is a single canonical library and the legacy preference is ignored.

use std::borrow::Cow;

/// Library names the DSM is installed under.
pub mod names {
    /// Current DSM on Windows.
    pub const WINDOWS_CURRENT: &str = "TWAINDSM.dll";
    /// Legacy 32-bit DSM shipped with older Windows releases.
    pub const WINDOWS_LEGACY: &str = "TWAIN_32.dll";
    /// System TWAIN framework on macOS.
    pub const MACOS_FRAMEWORK: &str = "/System/Library/Frameworks/TWAIN.framework/TWAIN";
    /// DSM on Linux and other Unix systems.
    pub const UNIX_CURRENT: &str = "TWAINDSM.so";
}

/// Which names to try, and in what order, when loading the DSM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPolicy {
    current: Cow<'static, str>,
    legacy: Option<Cow<'static, str>>,
}

impl SearchPolicy {
    /// A policy with one canonical name.
    pub const fn single(name: &'static str) -> Self {
        Self {
            current: Cow::Borrowed(name),
            legacy: None,
        }
    }

    /// A policy with a current and a legacy name.
    pub const fn with_legacy(current: &'static str, legacy: &'static str) -> Self {
        Self {
            current: Cow::Borrowed(current),
            legacy: Some(Cow::Borrowed(legacy)),
        }
    }

    /// A single user-supplied name or path.
    pub fn custom(name: impl Into<String>) -> Self {
        Self {
            current: Cow::Owned(name.into()),
            legacy: None,
        }
    }

    /// The policy compiled in for this target.
    pub fn platform() -> Self {
        PLATFORM_POLICY
    }

    pub fn current(&self) -> &str {
        &self.current
    }

    pub fn legacy(&self) -> Option<&str> {
        self.legacy.as_deref()
    }

    pub fn has_legacy(&self) -> bool {
        self.legacy.is_some()
    }

    /// Names to attempt, in order.
    ///
    /// `prefer_legacy` only matters when the policy has a legacy name.
    pub fn candidates(&self, prefer_legacy: bool) -> Vec<&str> {
        let current: &str = &self.current;
        match self.legacy.as_deref() {
            Some(legacy) if prefer_legacy => vec![legacy, current],
            Some(legacy) => vec![current, legacy],
            None => vec![current],
        }
    }
}

impl Default for SearchPolicy {
    fn default() -> Self {
        Self::platform()
    }
}

#[cfg(all(windows, target_pointer_width = "32"))]
const PLATFORM_POLICY: SearchPolicy =
    SearchPolicy::with_legacy(names::WINDOWS_CURRENT, names::WINDOWS_LEGACY);

#[cfg(all(windows, not(target_pointer_width = "32")))]
const PLATFORM_POLICY: SearchPolicy = SearchPolicy::single(names::WINDOWS_CURRENT);

#[cfg(target_os = "macos")]
const PLATFORM_POLICY: SearchPolicy = SearchPolicy::single(names::MACOS_FRAMEWORK);

#[cfg(not(any(windows, target_os = "macos")))]
const PLATFORM_POLICY: SearchPolicy = SearchPolicy::single(names::UNIX_CURRENT);

/// Short label of the compiled-in target family, for logs.
#[cfg(all(windows, target_pointer_width = "32"))]
pub const PLATFORM_LABEL: &str = "windows-32";

#[cfg(all(windows, not(target_pointer_width = "32")))]
pub const PLATFORM_LABEL: &str = "windows-64";

#[cfg(target_os = "macos")]
pub const PLATFORM_LABEL: &str = "macos";

#[cfg(not(any(windows, target_os = "macos")))]
pub const PLATFORM_LABEL: &str = "unix";
