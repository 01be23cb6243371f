use std::path::PathBuf;

fn main() {
    sails_rs::build_wasm();

    if let Ok(bin_path) = std::fs::read_to_string(".binpath") {
        let wasm_path = PathBuf::from(bin_path.trim());
        let idl_path = wasm_path.with_extension("idl");

        sails_idl_gen::generate_idl_to_file::<presale_app::PresaleProgram>(&idl_path).unwrap();
    }
}
