fn main() {
    println!("cargo:rerun-if-env-changed=AQUASENTRY_DB_URL");
    println!("cargo:rerun-if-env-changed=AQUASENTRY_DB_AUTH");
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
