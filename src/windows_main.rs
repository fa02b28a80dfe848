#![cfg(windows)]

use anyhow::{Context, Result};
use std::any::Any;
use std::cell::RefCell;
use std::path::PathBuf;
use windows::Win32::Foundation::{HWND, LPARAM, LRESULT, RECT, WPARAM};
use windows::Win32::Graphics::Gdi::{
    BeginPaint, COLOR_WINDOW, DT_CENTER, DT_WORDBREAK, DrawTextW, EndPaint, HBRUSH, PAINTSTRUCT,
};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::WindowsAndMessaging::*;
use windows::core::{PCWSTR, w};

use svctoggle::bootstrap::{self, Bootstrap};
use svctoggle::config::{self, Config, KeyChord};
use svctoggle::core::{self as toggler, ToggleOutcome};
use svctoggle::elevation;
use svctoggle::hotkeys::{self, HK_TOGGLE_SERVICE, HotkeyGuard};
use svctoggle::scm::LocalScm;
use svctoggle::ui;

const WND_CLASS: PCWSTR = w!("ServiceTogglerWndClass");
const WM_STARTUP_NOTICES: u32 = WM_APP + 1;

const ADMIN_NOTICE: &str =
    "This application requires administrator privileges to function properly.";

thread_local! {
    static APP: RefCell<Option<AppState>> = const { RefCell::new(None) };
}

struct AppState {
    cfg: Config,
    chord: KeyChord,
    // Dropping the guard unregisters the hotkey.
    hotkey: Option<HotkeyGuard>,
}

impl AppState {
    fn hint(&self) -> String {
        format!(
            "Press {} to toggle {}.\nPress Q to quit.",
            hotkeys::describe(&self.chord),
            self.cfg.service_name
        )
    }
}

fn init_state(hwnd: HWND) -> AppState {
    let cfg = match config::load_or_default() {
        Ok((cfg, paths)) => {
            tracing::info!(cfg_file = ?paths.cfg_file, service = %cfg.service_name, "config loaded");
            cfg
        }
        Err(e) => {
            tracing::warn!("Config unavailable: {:#}, using defaults", e);
            Config::default()
        }
    };
    let (chord, modifiers, vk) = hotkeys::resolve(&cfg.hotkey);
    let hotkey = match hotkeys::register(hwnd, HK_TOGGLE_SERVICE, modifiers, vk) {
        Ok(guard) => Some(guard),
        Err(e) => {
            tracing::error!("RegisterHotKey failed: {}", e);
            None
        }
    };
    AppState { cfg, chord, hotkey }
}

fn show_startup_notices(hwnd: HWND) {
    // Snapshot first; message boxes pump messages and re-enter wndproc.
    let notice = APP.with(|slot| {
        slot.borrow().as_ref().map(|app| match app.hotkey {
            Some(_) => Ok(format!(
                "Hotkey registered. Press {} to toggle the service.\nPress 'Q' to quit the program.",
                hotkeys::describe(&app.chord)
            )),
            None => Err("Failed to register hotkey.".to_string()),
        })
    });
    match notice {
        Some(Ok(text)) => ui::info(Some(hwnd), &text),
        Some(Err(text)) => ui::error(Some(hwnd), &text),
        None => {}
    }
    ui::apply_window_icon(hwnd, &ui::icon_path());
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn toggle_service(hwnd: HWND) {
    let name = APP.with(|slot| slot.borrow().as_ref().map(|app| app.cfg.service_name.clone()));
    let Some(name) = name else { return };
    tracing::info!(service = %name, "toggle requested");

    let result = std::panic::catch_unwind(|| toggler::toggle(LocalScm::connect, &name));
    let (text, failed) = match result {
        Ok(outcome) => {
            match &outcome {
                ToggleOutcome::Failed(e) => tracing::warn!(service = %name, "toggle failed: {}", e),
                other => tracing::info!(service = %name, outcome = ?other, "toggle finished"),
            }
            (outcome.message(&name), outcome.is_failure())
        }
        Err(payload) => {
            let msg = panic_message(payload.as_ref());
            tracing::error!(service = %name, "toggle panicked: {}", msg);
            (format!("An error occurred: {}", msg), true)
        }
    };
    if failed {
        ui::error(Some(hwnd), &text);
    } else {
        ui::info(Some(hwnd), &text);
    }
}

fn release_hotkey() {
    let guard = APP.with(|slot| slot.borrow_mut().as_mut().and_then(|app| app.hotkey.take()));
    drop(guard);
}

fn paint(hwnd: HWND) {
    let hint = APP.with(|slot| slot.borrow().as_ref().map(AppState::hint));
    unsafe {
        let mut ps = PAINTSTRUCT::default();
        let hdc = BeginPaint(hwnd, &mut ps);
        if let Some(hint) = hint {
            let mut rc = RECT::default();
            if GetClientRect(hwnd, &mut rc).is_ok() {
                rc.top += 24;
                let mut text: Vec<u16> = hint.encode_utf16().collect();
                DrawTextW(hdc, &mut text, &mut rc, DT_CENTER | DT_WORDBREAK);
            }
        }
        let _ = EndPaint(hwnd, &ps);
    }
}

extern "system" fn wndproc(hwnd: HWND, msg: u32, w: WPARAM, l: LPARAM) -> LRESULT {
    match msg {
        WM_CREATE => {
            let app = init_state(hwnd);
            APP.with(|slot| *slot.borrow_mut() = Some(app));
            unsafe {
                let _ = PostMessageW(hwnd, WM_STARTUP_NOTICES, WPARAM(0), LPARAM(0));
            }
            LRESULT(0)
        }
        WM_STARTUP_NOTICES => {
            show_startup_notices(hwnd);
            LRESULT(0)
        }
        WM_HOTKEY => {
            if w.0 as i32 == HK_TOGGLE_SERVICE {
                toggle_service(hwnd);
            }
            LRESULT(0)
        }
        WM_CHAR => {
            if hotkeys::is_quit_key(w.0 as u32) {
                tracing::info!("quit key pressed");
                unsafe {
                    let _ = DestroyWindow(hwnd);
                }
            }
            LRESULT(0)
        }
        WM_PAINT => {
            paint(hwnd);
            LRESULT(0)
        }
        WM_ENDSESSION => {
            // Session is ending; WM_DESTROY may never arrive.
            if w.0 != 0 {
                release_hotkey();
            }
            LRESULT(0)
        }
        WM_DESTROY => {
            release_hotkey();
            unsafe { PostQuitMessage(0) };
            LRESULT(0)
        }
        _ => unsafe { DefWindowProcW(hwnd, msg, w, l) },
    }
}

fn single_instance_guard() -> bool {
    unsafe {
        let h = FindWindowW(WND_CLASS, None).unwrap_or(HWND(std::ptr::null_mut()));
        h.0.is_null()
    }
}

fn init_logging() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let log_dir = config::project_paths()
        .map(|p| p.log_dir)
        .unwrap_or_else(|_| PathBuf::from("."));
    std::fs::create_dir_all(&log_dir).ok();
    let file_appender = tracing_appender::rolling::daily(&log_dir, "svctoggle.log");
    let (nb, guard) = tracing_appender::non_blocking(file_appender);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(nb)
        .try_init()
        .ok()?;
    Some(guard)
}

pub fn main() -> Result<()> {
    let _log_guard = init_logging();

    let args: Vec<String> = std::env::args_os()
        .skip(1)
        .map(|a| a.to_string_lossy().into_owned())
        .collect();
    match bootstrap::plan(elevation::is_elevated(), &args) {
        Bootstrap::Proceed { .. } => {}
        Bootstrap::Relaunch { parameters } => {
            if let Err(e) = elevation::relaunch_elevated(&parameters) {
                tracing::warn!("Elevation declined or failed: {:#}", e);
                ui::error(None, ADMIN_NOTICE);
            }
            return Ok(());
        }
        Bootstrap::GiveUp => {
            tracing::warn!("Relaunched instance is still not elevated");
            ui::error(None, ADMIN_NOTICE);
            return Ok(());
        }
    }

    if !single_instance_guard() {
        tracing::info!("Another instance is already running. Exiting.");
        return Ok(());
    }

    unsafe {
        let hinst = GetModuleHandleW(None).context("GetModuleHandleW")?;
        let wc = WNDCLASSW {
            lpfnWndProc: Some(wndproc),
            hInstance: hinst.into(),
            lpszClassName: WND_CLASS,
            hCursor: LoadCursorW(None, IDC_ARROW).unwrap_or_default(),
            hbrBackground: HBRUSH((COLOR_WINDOW.0 + 1) as usize as *mut std::ffi::c_void),
            ..Default::default()
        };
        if RegisterClassW(&wc) == 0 {
            anyhow::bail!("RegisterClassW failed");
        }

        let hwnd = CreateWindowExW(
            WINDOW_EX_STYLE(0),
            WND_CLASS,
            w!("Service Toggler"),
            WS_OVERLAPPEDWINDOW,
            CW_USEDEFAULT,
            CW_USEDEFAULT,
            300,
            200,
            None,
            None,
            hinst,
            None,
        )
        .context("CreateWindowExW")?;
        let _ = ShowWindow(hwnd, SW_SHOW);

        let mut msg = MSG::default();
        while GetMessageW(&mut msg, HWND(std::ptr::null_mut()), 0, 0).0 > 0 {
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
    }

    // Covers loop exits that skipped WM_DESTROY.
    APP.with(|slot| slot.borrow_mut().take());
    tracing::info!("exiting");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_payloads_become_messages() {
        let err = std::panic::catch_unwind(|| -> u32 { panic!("boom") }).unwrap_err();
        assert_eq!(panic_message(err.as_ref()), "boom");
        let err = std::panic::catch_unwind(|| -> u32 { panic!("{} {}", "bad", 7) }).unwrap_err();
        assert_eq!(panic_message(err.as_ref()), "bad 7");
    }

    #[test]
    fn hint_names_chord_and_service() {
        let app = AppState {
            cfg: Config::default(),
            chord: KeyChord::default(),
            hotkey: None,
        };
        assert_eq!(
            app.hint(),
            "Press Ctrl + Shift + K to toggle WpcMonSvc.\nPress Q to quit."
        );
    }

    // Registering against a real window and dropping the state must leave the
    // chord free for the next registration.
    #[test]
    fn hotkey_guard_releases_on_drop() {
        unsafe extern "system" fn test_wndproc(
            hwnd: HWND,
            msg: u32,
            w: WPARAM,
            l: LPARAM,
        ) -> LRESULT {
            unsafe { DefWindowProcW(hwnd, msg, w, l) }
        }

        unsafe {
            let class_name = w!("ServiceTogglerTestWndClass");
            let hinst = GetModuleHandleW(None).unwrap();
            let wc = WNDCLASSW {
                lpfnWndProc: Some(test_wndproc),
                hInstance: hinst.into(),
                lpszClassName: class_name,
                ..Default::default()
            };
            RegisterClassW(&wc);
            let hwnd = CreateWindowExW(
                WINDOW_EX_STYLE(0),
                class_name,
                w!(""),
                WS_POPUP,
                0,
                0,
                10,
                10,
                None,
                None,
                hinst,
                None,
            )
            .unwrap();

            // Ctrl+Alt+Shift+F23 is unlikely to be taken on a test machine.
            let mods = hotkeys::MOD_CONTROL | hotkeys::MOD_ALT | hotkeys::MOD_SHIFT;
            let vk = hotkeys::vk_from_key("F23").unwrap();
            let first = hotkeys::register(hwnd, 1, mods, vk).expect("first registration");
            assert!(hotkeys::register(hwnd, 2, mods, vk).is_err());
            drop(first);
            let again = hotkeys::register(hwnd, 3, mods, vk).expect("re-registration");
            drop(again);
            let _ = DestroyWindow(hwnd);
        }
    }

    unsafe extern "system" fn passive_wndproc(
        hwnd: HWND,
        msg: u32,
        w: WPARAM,
        l: LPARAM,
    ) -> LRESULT {
        unsafe { DefWindowProcW(hwnd, msg, w, l) }
    }

    unsafe fn passive_window(class_name: PCWSTR) -> HWND {
        unsafe {
            let hinst = GetModuleHandleW(None).unwrap();
            let wc = WNDCLASSW {
                lpfnWndProc: Some(passive_wndproc),
                hInstance: hinst.into(),
                lpszClassName: class_name,
                ..Default::default()
            };
            RegisterClassW(&wc);
            CreateWindowExW(
                WINDOW_EX_STYLE(0),
                class_name,
                w!(""),
                WS_POPUP,
                0,
                0,
                10,
                10,
                None,
                None,
                hinst,
                None,
            )
            .unwrap()
        }
    }

    // The WM_DESTROY / WM_ENDSESSION path goes through release_hotkey, which
    // must take the guard out of APP and free the chord.
    #[test]
    fn release_hotkey_frees_chord_held_by_app_state() {
        unsafe {
            let hwnd = passive_window(w!("ServiceTogglerReleaseTestWndClass"));
            let mods = hotkeys::MOD_CONTROL | hotkeys::MOD_ALT | hotkeys::MOD_SHIFT;
            let vk = hotkeys::vk_from_key("F22").unwrap();
            let guard = hotkeys::register(hwnd, HK_TOGGLE_SERVICE, mods, vk)
                .expect("initial registration");
            APP.with(|slot| {
                *slot.borrow_mut() = Some(AppState {
                    cfg: Config::default(),
                    chord: KeyChord::default(),
                    hotkey: Some(guard),
                })
            });
            assert!(hotkeys::register(hwnd, 11, mods, vk).is_err());

            release_hotkey();

            let still_held = APP.with(|slot| {
                slot.borrow().as_ref().map(|app| app.hotkey.is_some())
            });
            assert_eq!(still_held, Some(false));
            let again = hotkeys::register(hwnd, 12, mods, vk).expect("chord free after release");
            drop(again);

            // A second release is a no-op.
            release_hotkey();
            APP.with(|slot| slot.borrow_mut().take());
            let _ = DestroyWindow(hwnd);
        }
    }
}
