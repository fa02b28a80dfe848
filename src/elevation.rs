//! Elevation detection and relaunch.

#![cfg(windows)]

use anyhow::{Context, Result};
use windows::Win32::Foundation::{CloseHandle, HANDLE};
use windows::Win32::Security::{GetTokenInformation, TOKEN_ELEVATION, TOKEN_QUERY, TokenElevation};
use windows::Win32::System::Threading::{GetCurrentProcess, OpenProcessToken};
use windows::Win32::UI::Shell::ShellExecuteW;
use windows::Win32::UI::WindowsAndMessaging::SW_SHOWNORMAL;
use windows::core::{PCWSTR, w};

use crate::utils::to_utf16;

pub fn is_elevated() -> bool {
    unsafe {
        let mut token = HANDLE::default();
        if OpenProcessToken(GetCurrentProcess(), TOKEN_QUERY, &mut token).is_err() {
            return false;
        }
        let mut elevation = TOKEN_ELEVATION::default();
        let mut len = 0u32;
        let ok = GetTokenInformation(
            token,
            TokenElevation,
            Some(&mut elevation as *mut _ as *mut _),
            std::mem::size_of::<TOKEN_ELEVATION>() as u32,
            &mut len,
        )
        .is_ok();
        let _ = CloseHandle(token);
        ok && elevation.TokenIsElevated != 0
    }
}

/// Start this executable again through the UAC prompt.
///
/// Fails when the user declines the prompt or the shell cannot launch it.
pub fn relaunch_elevated(parameters: &str) -> Result<()> {
    let exe = std::env::current_exe().context("locating current executable")?;
    let exe_w = to_utf16(&exe.to_string_lossy());
    let params_w = to_utf16(parameters);
    let hinst = unsafe {
        ShellExecuteW(
            None,
            w!("runas"),
            PCWSTR(exe_w.as_ptr()),
            PCWSTR(params_w.as_ptr()),
            None,
            SW_SHOWNORMAL,
        )
    };
    // Values above 32 mean the launch went through.
    let rv = hinst.0 as isize;
    if rv <= 32 {
        anyhow::bail!("ShellExecuteW runas failed: code {}", rv);
    }
    tracing::info!(exe = %exe.display(), parameters, "relaunched elevated");
    Ok(())
}
