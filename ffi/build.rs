use std::env;
use std::path::PathBuf;

fn main() {
    let crate_dir = env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
    println!("cargo:rerun-if-changed=src/lib.rs");
    println!("cargo:rerun-if-changed=src/types.rs");

    let config = cbindgen::Config {
        language: cbindgen::Language::C,
        include_guard: Some("STOREFRONT_H".to_string()),
        ..Default::default()
    };

    // Header generation is best effort; the library builds without it.
    match cbindgen::Builder::new()
        .with_crate(&crate_dir)
        .with_config(config)
        .generate()
    {
        Ok(bindings) => {
            let out = PathBuf::from(&crate_dir).join("include").join("storefront.h");
            if let Some(dir) = out.parent() {
                let _ = std::fs::create_dir_all(dir);
            }
            bindings.write_to_file(out);
        }
        Err(e) => println!("cargo:warning=skipping C header generation: {e}"),
    }
}
