use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use calc_interpreter::{Error, Interpreter, Lexer, Node, parse, tokenize};
use clap::{ArgAction, Parser, Subcommand};
use miette::{IntoDiagnostic, NamedSource, Report, WrapErr};
use tracing::{Level, info};

#[derive(Parser, Debug)]
#[command(version, about = "Interpreter for integer arithmetic and comparisons")]
struct Args {
    /// Log verbosity on stderr: -v info, -vv debug, -vvv trace
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print one token per line
    Tokenize { filename: PathBuf },
    /// Print every statement as an s-expression
    Parse { filename: PathBuf },
    /// Evaluate a file and print the last statement's value
    Run { filename: PathBuf },
    /// Evaluate a program given on the command line
    Eval { source: String },
    /// Read programs line by line, keeping variables between lines
    Repl,
}

fn main() -> miette::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    match args.command {
        Commands::Tokenize { filename } => {
            let file_contents = read_source(&filename)?;
            let name = filename.display().to_string();

            for token in Lexer::new(&file_contents) {
                let token = match token {
                    Ok(token) => token,
                    Err(e) => exit_with(&name, &file_contents, e.into()),
                };
                println!("{token}");
            }
            println!("EOF  null");
        }
        Commands::Parse { filename } => {
            let file_contents = read_source(&filename)?;
            let name = filename.display().to_string();

            let statements = match parse_source(&file_contents) {
                Ok(statements) => statements,
                Err(e) => exit_with(&name, &file_contents, e),
            };
            for statement in statements {
                println!("{statement}");
            }
        }
        Commands::Run { filename } => {
            let file_contents = read_source(&filename)?;
            info!(path = %filename.display(), "running file");
            evaluate(&filename.display().to_string(), &file_contents);
        }
        Commands::Eval { source } => evaluate("<input>", &source),
        Commands::Repl => repl()?,
    }
    Ok(())
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn read_source(filename: &Path) -> miette::Result<String> {
    fs::read_to_string(filename)
        .into_diagnostic()
        .wrap_err_with(|| format!("reading `{}` failed", filename.display()))
}

fn parse_source(source: &str) -> Result<Vec<Node<'_>>, Error> {
    let tokens = tokenize(source)?;
    Ok(parse(&tokens)?)
}

fn evaluate(name: &str, source: &str) {
    match Interpreter::new().run(source) {
        Ok(Some(value)) => println!("{value}"),
        Ok(None) => {}
        Err(e) => exit_with(name, source, e),
    }
}

fn report(name: &str, source: &str, error: Error) -> Report {
    Report::new(error).with_source_code(NamedSource::new(name, source.to_string()))
}

fn exit_with(name: &str, source: &str, error: Error) -> ! {
    let code = match error {
        Error::Lex(_) | Error::Parse(_) => 65,
        Error::Eval(_) => 70,
    };
    eprintln!("{:?}", report(name, source, error));
    std::process::exit(code);
}

fn repl() -> miette::Result<()> {
    let mut interpreter = Interpreter::new();
    let stdin = io::stdin();
    let mut line = String::new();

    loop {
        print!("> ");
        io::stdout().flush().into_diagnostic()?;

        line.clear();
        if stdin.lock().read_line(&mut line).into_diagnostic()? == 0 {
            break;
        }

        let source = line.trim();
        match source {
            "" => continue,
            ":env" => {
                for (name, value) in interpreter.environment().iter() {
                    println!("{name} = {value}");
                }
                continue;
            }
            _ => {}
        }

        match interpreter.run(source) {
            Ok(Some(value)) => println!("{value}"),
            Ok(None) => {}
            Err(e) => eprintln!("{:?}", report("<repl>", source, e)),
        }
    }

    info!(bindings = interpreter.environment().len(), "repl finished");
    Ok(())
}
