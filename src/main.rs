fn main() {
    let res = ptree::app::run();
    if let Err(err) = res {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}
