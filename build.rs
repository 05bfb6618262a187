fn main() {
    println!("cargo:rerun-if-changed=lbm_component");

    // Host builds (tests, property checks) never link the modem component.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
