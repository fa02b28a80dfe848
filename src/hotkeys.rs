//! Global hotkey chord parsing and registration.

use crate::config::KeyChord;

pub const HK_TOGGLE_SERVICE: i32 = 9000;

// Mirrors HOT_KEY_MODIFIERS bit values so parsing stays platform independent.
pub const MOD_ALT: u32 = 0x0001;
pub const MOD_CONTROL: u32 = 0x0002;
pub const MOD_SHIFT: u32 = 0x0004;
pub const MOD_WIN: u32 = 0x0008;
pub const MOD_NOREPEAT: u32 = 0x4000;

/// Map a key name from the config to a virtual-key code.
pub fn vk_from_key(key: &str) -> Option<u32> {
    let key = key.trim();
    let upper = key.to_ascii_uppercase();
    let mut chars = upper.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        // VK codes for A-Z and 0-9 equal their ASCII values.
        if c.is_ascii_uppercase() || c.is_ascii_digit() {
            return Some(c as u32);
        }
        return None;
    }
    let n: u32 = upper.strip_prefix('F')?.parse().ok()?;
    // VK_F1 = 0x70 .. VK_F24 = 0x87
    (1..=24).contains(&n).then(|| 0x70 + n - 1)
}

pub fn modifier_bits(chord: &KeyChord) -> u32 {
    let mut bits = MOD_NOREPEAT;
    if chord.ctrl {
        bits |= MOD_CONTROL;
    }
    if chord.alt {
        bits |= MOD_ALT;
    }
    if chord.shift {
        bits |= MOD_SHIFT;
    }
    if chord.win {
        bits |= MOD_WIN;
    }
    bits
}

/// Human readable chord, e.g. `Ctrl + Shift + K`.
pub fn describe(chord: &KeyChord) -> String {
    let mut parts: Vec<String> = Vec::new();
    if chord.ctrl {
        parts.push("Ctrl".into());
    }
    if chord.alt {
        parts.push("Alt".into());
    }
    if chord.shift {
        parts.push("Shift".into());
    }
    if chord.win {
        parts.push("Win".into());
    }
    parts.push(chord.key.trim().to_ascii_uppercase());
    parts.join(" + ")
}

/// Resolve the configured chord to `(chord used, modifiers, vk)`, falling back to the default chord.
pub fn resolve(chord: &KeyChord) -> (KeyChord, u32, u32) {
    match vk_from_key(&chord.key) {
        Some(vk) => (chord.clone(), modifier_bits(chord), vk),
        None => {
            tracing::warn!(key = %chord.key, "Unrecognised hotkey key, using default chord");
            let fallback = KeyChord::default();
            let vk = vk_from_key(&fallback.key).unwrap_or(0x4B);
            let bits = modifier_bits(&fallback);
            (fallback, bits, vk)
        }
    }
}

/// `q` or `Q` typed into the focused window ends the program.
pub fn is_quit_key(code: u32) -> bool {
    matches!(char::from_u32(code), Some('q' | 'Q'))
}

#[cfg(windows)]
pub use win::{HotkeyGuard, register};

#[cfg(windows)]
mod win {
    use windows::Win32::Foundation::HWND;
    use windows::Win32::UI::Input::KeyboardAndMouse::{
        HOT_KEY_MODIFIERS, RegisterHotKey, UnregisterHotKey,
    };

    /// Keeps a hotkey registered until dropped.
    #[derive(Debug)]
    pub struct HotkeyGuard {
        hwnd: HWND,
        id: i32,
    }

    impl Drop for HotkeyGuard {
        fn drop(&mut self) {
            if let Err(e) = unsafe { UnregisterHotKey(self.hwnd, self.id) } {
                tracing::warn!(id = self.id, "UnregisterHotKey failed: {}", e);
            } else {
                tracing::info!(id = self.id, "hotkey unregistered");
            }
        }
    }

    pub fn register(
        hwnd: HWND,
        id: i32,
        modifiers: u32,
        vk: u32,
    ) -> windows::core::Result<HotkeyGuard> {
        unsafe { RegisterHotKey(hwnd, id, HOT_KEY_MODIFIERS(modifiers), vk) }?;
        tracing::info!(id, modifiers, vk, "hotkey registered");
        Ok(HotkeyGuard { hwnd, id })
    }
}
