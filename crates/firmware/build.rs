fn main() {
    // Linker scripts only apply to the target binary; host test builds link normally.
    // memory.x comes from embassy-stm32's `memory-x` feature.
    #[cfg(feature = "hardware")]
    {
        println!("cargo:rustc-link-arg-bins=--nmagic");
        println!("cargo:rustc-link-arg-bins=-Tlink.x");
        println!("cargo:rustc-link-arg-bins=-Tdefmt.x");
    }

    println!("cargo:rerun-if-changed=build.rs");
}
