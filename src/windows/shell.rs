//! Shell-side cleanup that accompanies the volume cache flush

use tracing::debug;
use windows::core::PCWSTR;
use windows::Win32::Foundation::HWND;
use windows::Win32::UI::Shell::{
    SHEmptyRecycleBinW, SHERB_NOCONFIRMATION, SHERB_NOPROGRESSUI, SHERB_NOSOUND,
};

/// Empty the recycle bin on every drive without any UI.
///
/// Returns false when the shell refuses, which includes an already empty bin.
pub fn empty_recycle_bin() -> bool {
    match unsafe {
        SHEmptyRecycleBinW(
            HWND::default(),
            PCWSTR::null(),
            SHERB_NOCONFIRMATION | SHERB_NOPROGRESSUI | SHERB_NOSOUND,
        )
    } {
        Ok(()) => true,
        Err(e) => {
            debug!("SHEmptyRecycleBinW: {}", e);
            false
        }
    }
}
