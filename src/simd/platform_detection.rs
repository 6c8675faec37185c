//! Platform detection and capability detection for the probe backends
//!
//! This module provides runtime detection of CPU features to select the
//! optimal duplicate-distance probe implementation for the current
//! environment. Detection runs once and is cached for the process lifetime.

/// Supported CPU architectures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Architecture {
    /// x86_64 architecture
    X86_64,
    /// ARM architecture
    ARM,
    /// Unknown architecture
    Unknown,
}

/// Platform capabilities and detected features
#[derive(Debug, Clone)]
pub struct PlatformCapabilities {
    /// x86_64 AVX2 instruction support
    pub has_avx2: bool,
    /// x86_64 AVX-512 instruction support
    pub has_avx512: bool,
    /// Detected architecture
    pub architecture: Architecture,
}

impl Default for PlatformCapabilities {
    fn default() -> Self {
        Self::detect()
    }
}

impl PlatformCapabilities {
    /// Detect platform capabilities at runtime
    pub fn detect() -> Self {
        Self {
            has_avx2: Self::detect_avx2_support(),
            has_avx512: Self::detect_avx512_support(),
            architecture: Self::detect_architecture(),
        }
    }

    /// Detect CPU architecture
    fn detect_architecture() -> Architecture {
        #[cfg(target_arch = "x86_64")]
        {
            Architecture::X86_64
        }

        #[cfg(target_arch = "aarch64")]
        {
            Architecture::ARM
        }

        #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
        {
            Architecture::Unknown
        }
    }

    /// Detect x86_64 AVX2 instruction support
    #[cfg(target_arch = "x86_64")]
    fn detect_avx2_support() -> bool {
        use std::arch::x86_64::__cpuid;

        // Check CPUID feature flags for AVX2 support
        // AVX2 requires:
        // 1. AVX support (bit 28 in ECX from CPUID leaf 1)
        // 2. AVX2 support (bit 5 in EBX from CPUID leaf 7)
        let cpuid1 = __cpuid(1);
        let has_avx = (cpuid1.ecx & (1 << 28)) != 0; // AVX bit in ECX register

        let cpuid7 = __cpuid(7);
        let has_avx2 = (cpuid7.ebx & (1 << 5)) != 0; // AVX2 bit in EBX register

        has_avx && has_avx2
    }

    /// Detect x86_64 AVX-512 instruction support
    #[cfg(target_arch = "x86_64")]
    fn detect_avx512_support() -> bool {
        use std::arch::x86_64::__cpuid;

        // Check CPUID feature flags for AVX-512 support
        // AVX-512 requires:
        // 1. OSXSAVE support (bit 27 in ECX from CPUID leaf 1)
        // 2. AVX-512F (Foundation) support (bit 16 in EBX from CPUID leaf 7)
        let cpuid1 = __cpuid(1);
        let has_osxsave = (cpuid1.ecx & (1 << 27)) != 0; // OSXSAVE bit in ECX register

        if !has_osxsave {
            return false;
        }

        let cpuid7 = __cpuid(7);
        (cpuid7.ebx & (1 << 16)) != 0 // AVX-512F bit in EBX register
    }

    /// Fallback implementations for non-x86_64 platforms
    #[cfg(not(target_arch = "x86_64"))]
    fn detect_avx2_support() -> bool {
        false
    }

    #[cfg(not(target_arch = "x86_64"))]
    fn detect_avx512_support() -> bool {
        false
    }

    /// Check if the 256-bit gather probe can run on this CPU
    pub fn should_use_avx2(&self) -> bool {
        self.has_avx2
    }

    /// Check if the 512-bit gather probe can run on this CPU
    pub fn should_use_avx512(&self) -> bool {
        self.has_avx512
    }

    /// Get platform summary string
    pub fn get_summary(&self) -> String {
        format!(
            "Architecture: {:?}, AVX2: {}, AVX-512: {}",
            self.architecture, self.has_avx2, self.has_avx512
        )
    }
}

/// Global platform capabilities instance
static PLATFORM_CAPABILITIES: std::sync::OnceLock<PlatformCapabilities> =
    std::sync::OnceLock::new();

/// Get the global platform capabilities instance
pub fn get_platform_capabilities() -> &'static PlatformCapabilities {
    PLATFORM_CAPABILITIES.get_or_init(PlatformCapabilities::detect)
}

/// Get platform summary for debugging
pub fn get_platform_summary() -> String {
    get_platform_capabilities().get_summary()
}
