use std::env;
use std::fs;
use std::path::Path;

fn main() {
    // Create config template if it doesn't exist
    let out_dir = env::var("OUT_DIR").unwrap_or_else(|_| "./".to_string());
    let template_path = Path::new(&out_dir).join("../../../config.template.toml");

    let template = r#"# LSTK Configuration Template
# Copy this file to 'lstk_config.toml' and adjust the values

# Elementary stream PIDs
video_pid = 256
audio_pid = 257

# Program map table PID
pmt_pid = 4096

# Minimum spacing between program clock references, in milliseconds
pcr_interval_ms = 40

# PAT/PMT repetition for programs without video, in milliseconds
psi_interval_ms = 100
"#;

    let _ = fs::write(template_path, template);
    println!("cargo:rerun-if-changed=build.rs");
}
