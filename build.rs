use embed_manifest::manifest::{DpiAwareness, ExecutionLevel};
use embed_manifest::{embed_manifest, new_manifest};

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=icon.ico");
    if std::env::var_os("CARGO_CFG_WINDOWS").is_none() {
        return;
    }

    // Elevation is requested at runtime through a relaunch, so run as invoker.
    let manifest = new_manifest("ServiceToggler")
        .requested_execution_level(ExecutionLevel::AsInvoker)
        .dpi_awareness(DpiAwareness::PerMonitorV2);
    if let Err(e) = embed_manifest(manifest) {
        println!("cargo:warning=Failed to embed manifest: {}", e);
    }

    if std::path::Path::new("icon.ico").exists() {
        let mut res = winres::WindowsResource::new();
        res.set_icon("icon.ico");
        res.set("ProductName", "Service Toggler");
        res.set("FileDescription", "Toggle a Windows service with a global hotkey");
        if let Err(e) = res.compile() {
            println!("cargo:warning=Failed to compile Windows resources: {}", e);
        }
    }
}
