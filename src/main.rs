use std::env;
use std::fs;
use std::process;
use getopts::Options;
use lalrgen::grammar_file;
use lalrgen::{LrMethod, Report};

fn main() {
  env_logger::init();

  let args = env::args().collect::<Vec<_>>();
  let prog = args[0].clone();
  let mut opts = Options::new();
  opts.optopt("t", "type",
    "Type of parser generation algorithm. Defaults to LALR.\n\
      Supported types: LALR, SLR (case insensitive)",
    "TYPE");
  opts.optflag("h", "help", "Print this message");

  let matches = match opts.parse(&args[1..]) {
    Ok(m) => m,
    Err(err) => {
      eprintln!("{}", err);
      process::exit(1);
    }
  };

  if matches.opt_present("h") {
    print_usage(prog, opts);
    return;
  }

  let method = match matches.opt_str("t").map(|t| t.to_lowercase()).as_deref() {
    None | Some("lalr") => LrMethod::Lalr,
    Some("slr") => LrMethod::Slr,
    Some(ty) => {
      eprintln!("unsupported parser type: {}", ty);
      process::exit(1);
    }
  };

  let path = if matches.free.len() == 1 {
    matches.free[0].clone()
  } else {
    print_usage(prog, opts);
    process::exit(1);
  };

  let input = match fs::read_to_string(&path) {
    Ok(input) => input,
    Err(err) => {
      eprintln!("{}: {}", path, err);
      process::exit(1);
    }
  };

  match grammar_file::compile(&input, method) {
    Ok((grammar, table)) => print!("{}", Report::new(&grammar, &table)),
    Err(err) => {
      eprintln!("{}: {}", path, err);
      process::exit(1);
    }
  }
}

fn print_usage(prog: String, opts: Options) {
  let brief = format!("Usage: {} [options] PATH", prog);
  print!("{}", opts.usage(&brief));
}
