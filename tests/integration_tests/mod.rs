use std::path::PathBuf;

mod io;

fn data_output_path() -> PathBuf {
    std::env::temp_dir().join("fenris-codegen").join("integration_tests")
}
