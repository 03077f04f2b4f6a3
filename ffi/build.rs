fn main() {
    println!("cargo:rerun-if-changed=src");

    let crate_dir = std::env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR is set by cargo");
    let out_dir = std::env::var("OUT_DIR").expect("OUT_DIR is set by cargo");

    cbindgen::Builder::new()
        .with_crate(&crate_dir)
        .with_language(cbindgen::Language::C)
        .with_include_guard("GAKIDO_H")
        .with_documentation(true)
        .generate()
        .expect("generate C header")
        .write_to_file(format!("{out_dir}/gakido.h"));
}
