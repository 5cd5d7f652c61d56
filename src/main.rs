use smallsh::Interpreter;

fn main() {
    if let Err(err) = Interpreter::default().repl() {
        eprintln!("smallsh: {:#}", err);
        std::process::exit(1);
    }
}
