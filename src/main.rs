fn main() {
    arachne::cli::run();
}
