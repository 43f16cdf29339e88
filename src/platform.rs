//! Host OS/arch detection, generalized from `avm`'s `platform.rs`
//! (`current_os`/`current_cpu`) to the `linux`/`mac`/`windows` and
//! `amd64`/`aarch64`-style strings `spec.md` §6 uses as index keys.

#[allow(unreachable_code)]
pub fn current_os() -> Option<&'static str> {
    #[cfg(target_os = "windows")]
    return Some("windows");

    #[cfg(target_os = "linux")]
    return Some("linux");

    #[cfg(target_os = "macos")]
    return Some("mac");

    None
}

#[allow(unreachable_code)]
pub fn current_arch() -> Option<&'static str> {
    #[cfg(target_arch = "x86_64")]
    return Some("amd64");

    #[cfg(target_arch = "aarch64")]
    return Some("aarch64");

    #[cfg(target_arch = "x86")]
    return Some("x86");

    #[cfg(target_arch = "arm")]
    return Some("arm32");

    #[cfg(target_arch = "riscv64")]
    return Some("riscv64");

    None
}
