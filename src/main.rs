// Windows-only implementation lives in src/windows_main.rs
#[cfg(windows)]
mod windows_main;

#[cfg(windows)]
fn main() -> anyhow::Result<()> {
    windows_main::main()
}

// Non-Windows stub builds cleanly and informs the user.
#[cfg(not(windows))]
fn main() {
    println!("svctoggle controls Windows services and only runs on Windows.");
}
