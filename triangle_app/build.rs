// Build script for Vulkan shader compilation

use std::path::Path;
use std::process::Command;

fn main() {
    let shader_dir = Path::new("../shaders");
    let target_dir = Path::new("../target/shaders");

    println!("cargo:rerun-if-changed=../shaders");

    let entries = match std::fs::read_dir(shader_dir) {
        Ok(entries) => entries,
        Err(_) => {
            eprintln!("info: No shader directory found at: {:?}", shader_dir);
            return;
        }
    };

    if std::fs::create_dir_all(target_dir).is_err() {
        eprintln!("warning: Could not create shader output directory");
        return;
    }

    for entry in entries.flatten() {
        let path = entry.path();
        let Some(ext) = path.extension() else {
            continue;
        };
        if ext != "vert" && ext != "frag" {
            continue;
        }

        let file_name = path.file_name().unwrap().to_string_lossy().into_owned();
        let out_file = target_dir.join(format!("{file_name}.spv"));

        let status = Command::new("glslc")
            .arg(&path)
            .arg("-o")
            .arg(&out_file)
            .status();

        match status {
            Ok(status) if status.success() => {
                println!("cargo:rerun-if-changed={}", path.display());
            }
            Ok(_) => {
                eprintln!("warning: glslc failed to compile {:?}", path);
            }
            Err(_) => {
                // glslc not installed; precompiled .spv files can be used instead
                eprintln!("warning: glslc not found, skipping shader compilation");
                return;
            }
        }
    }
}
