fn main() {
    // Only espidf builds need the ESP-IDF build environment wired through;
    // plain host builds (tests) must not require it.
    if std::env::var("CARGO_FEATURE_ESPIDF").is_ok() {
        embuild::espidf::sysenv::output();
    }
}
