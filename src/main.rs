fn main() {
    if let Err(err) = nodegraph_format::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
