use std::env;
use std::path::{Path, PathBuf};

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=PDFIUM_LIB_DIR");

    let target = env::var("TARGET").unwrap_or_default();

    // Priority 1: Manual override via PDFIUM_LIB_DIR
    if let Ok(lib_dir) = env::var("PDFIUM_LIB_DIR") {
        let lib_dir = PathBuf::from(lib_dir);
        if has_pdfium(&lib_dir, &target) {
            println!("cargo:warning=Using PDFIUM_LIB_DIR: {}", lib_dir.display());
            setup_linking(&lib_dir, &target);
            return;
        }
        println!(
            "cargo:warning=PDFIUM_LIB_DIR={} does not contain a pdfium library",
            lib_dir.display()
        );
    }

    // Priority 2: Common system library directories
    if let Some(lib_dir) = system_dirs().into_iter().find(|d| has_pdfium(d, &target)) {
        setup_linking(&lib_dir, &target);
        return;
    }

    // Nothing found: the declarations stay unlinked. Any binary that actually
    // calls into PDFium will fail at link time until PDFIUM_LIB_DIR is set.
    println!(
        "cargo:warning=pdfium library not found; set PDFIUM_LIB_DIR to link against libpdfium"
    );
}

fn library_name(target: &str) -> &'static str {
    if target.contains("windows") {
        "pdfium.dll.lib"
    } else if target.contains("apple") {
        "libpdfium.dylib"
    } else {
        "libpdfium.so"
    }
}

fn has_pdfium(dir: &Path, target: &str) -> bool {
    dir.join(library_name(target)).exists()
}

fn system_dirs() -> Vec<PathBuf> {
    [
        "/usr/local/lib",
        "/usr/lib",
        "/usr/lib/x86_64-linux-gnu",
        "/usr/lib/aarch64-linux-gnu",
        "/opt/homebrew/lib",
    ]
    .iter()
    .map(PathBuf::from)
    .collect()
}

fn setup_linking(lib_dir: &Path, target: &str) {
    println!("cargo:rustc-link-search=native={}", lib_dir.display());
    println!("cargo:rustc-link-lib=dylib=pdfium");

    // Add rpath for runtime library discovery (macOS/Linux)
    if target.contains("apple") || target.contains("linux") {
        println!("cargo:rustc-link-arg=-Wl,-rpath,{}", lib_dir.display());
    }
}
