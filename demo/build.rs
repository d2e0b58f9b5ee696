use std::path::PathBuf;

use dbobj_gen::GenConfig;

fn main() {
    println!("cargo:rerun-if-changed=src/models.rs");

    let out_dir = PathBuf::from(std::env::var("OUT_DIR").expect("OUT_DIR is set by cargo"));
    let config = GenConfig {
        inputs: vec![PathBuf::from("src/models.rs")],
        output: Some(out_dir.join("db_generated.rs")),
        ..GenConfig::default()
    };
    if let Err(err) = config.run("build.rs") {
        panic!("dbgen failed: {err}");
    }
}
