use log::warn;
use nix::sys::utsname::uname;

/// Machine hardware name as reported by `uname(2)`.
pub(crate) fn machine() -> Option<String> {
    match uname() {
        Ok(uts) => Some(uts.machine().to_string_lossy().into_owned()),
        Err(e) => {
            warn!("uname failed: {}", e);
            None
        }
    }
}
