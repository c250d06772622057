use clap::Parser;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use sclisp::{EVAL_STACK_SIZE, Error};
use sclisp::ast::Value;
use sclisp::evaluator::{self, Environment};
use sclisp::scheme::{parse_all, parse_scheme};
use std::path::PathBuf;
use std::process;
use std::thread;

#[derive(Parser)]
#[command(name = "sclisp-repl")]
#[command(about = "Interactive read-eval-print loop for the sclisp interpreter")]
struct Args {
    /// Run every expression in this file instead of starting the prompt
    script: Option<PathBuf>,

    /// Skip the startup banner
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    // Deep recursion needs more stack than the main thread has
    let worker = thread::Builder::new()
        .name("sclisp-eval".to_owned())
        .stack_size(EVAL_STACK_SIZE)
        .spawn(move || match &args.script {
            Some(path) => run_script(path),
            None => run_repl(args.quiet),
        });

    let result = match worker {
        Ok(handle) => handle.join(),
        Err(err) => {
            eprintln!("Could not start the evaluator thread: {err}");
            process::exit(1);
        }
    };

    match result {
        Ok(code) => process::exit(code),
        Err(panic_info) => {
            eprintln!("The REPL encountered an unexpected error and must exit.");

            if let Some(msg) = panic_info.downcast_ref::<&str>() {
                eprintln!("Error: {msg}");
            } else if let Some(msg) = panic_info.downcast_ref::<String>() {
                eprintln!("Error: {msg}");
            } else {
                eprintln!("Error: Unknown panic occurred");
            }

            process::exit(1);
        }
    }
}

/// Evaluate every form in the file, stopping at the first fault
fn run_script(path: &PathBuf) -> i32 {
    let source = match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("Cannot read {}: {err}", path.display());
            return 1;
        }
    };

    let env = evaluator::create_global_env();
    let forms = match parse_all(&source) {
        Ok(forms) => forms,
        Err(err) => {
            eprintln!("Error: {err}");
            return 1;
        }
    };

    for form in &forms {
        match evaluator::eval(form, &env) {
            Ok(Value::Unspecified) => {}
            Ok(result) => println!("{result}"),
            Err(err) => {
                eprintln!("Error: {err}");
                return 1;
            }
        }
    }
    0
}

fn run_repl(quiet: bool) -> i32 {
    if !quiet {
        println!("sclisp - a minimal Lisp interpreter");
        println!("Enter expressions like: (define square (lambda (x) (* x x)))");
        println!("Type :help for more commands, or Ctrl+C to exit.");
        println!();
    }

    let mut rl = match DefaultEditor::new() {
        Ok(rl) => rl,
        Err(err) => {
            eprintln!("Could not initialize REPL: {err}");
            return 1;
        }
    };
    let env = evaluator::create_global_env();

    // Also callable from user code as (help)
    env.register_builtin_function("help", |_args| print_help());

    loop {
        match rl.readline("sclisp> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                match line {
                    ":help" => {
                        _ = print_help().is_ok();
                        continue;
                    }
                    ":env" => {
                        print_environment(&env);
                        continue;
                    }
                    ":quit" | ":exit" => {
                        println!("Goodbye!");
                        break;
                    }
                    _ => {}
                }

                match parse_scheme(line).and_then(|expr| evaluator::eval(&expr, &env)) {
                    // Don't print Unspecified values (e.g., from define)
                    Ok(Value::Unspecified) => {}
                    Ok(result) => println!("{result}"),
                    Err(e) => println!("Error: {e}"),
                }
            }

            Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => {
                println!("Goodbye!");
                break;
            }
            Err(err) => {
                println!("Error: {err:?}");
                return 1;
            }
        }
    }
    0
}

fn print_help() -> Result<Value, Error> {
    println!("sclisp commands:");
    println!("  :help      - Show this help message");
    println!("  :env       - Show current environment bindings");
    println!("  :quit      - Exit the interpreter");
    println!("  :exit      - Exit the interpreter");
    println!("  Ctrl+C     - Exit the interpreter");
    println!();
    println!("Special forms:");
    println!("  (quote x)  (if test then else)  (define name expr)");
    println!("  (set! name expr)  (lambda (params...) body)");
    println!();
    println!("Values:");
    println!("  Numbers: 42, -5, 2.5, 1e3");
    println!("  Truth: 0, 0.0 and () are false; predicates return 1 or 0");
    println!();
    println!("Examples:");
    println!("  (define fact (lambda (n) (if (<= n 1) 1 (* n (fact (- n 1))))))");
    println!("  (fact 10)");
    println!("  (map (lambda (x) (* x x)) (list 1 2 3))");
    println!();

    Ok(Value::Unspecified)
}

fn print_environment(env: &Environment) {
    let bindings = env.get_all_bindings();

    if bindings.is_empty() {
        println!("Environment is empty.");
        return;
    }

    println!("Environment bindings ({} total):", bindings.len());
    println!();

    // Separate built-in functions from user-defined values
    let mut builtins = Vec::new();
    let mut user_defined = Vec::new();

    for (name, value) in bindings {
        match value {
            Value::BuiltinFunction { .. } => builtins.push(name),
            _ => user_defined.push((name, value)),
        }
    }

    if !builtins.is_empty() {
        println!("Built-in functions ({}):", builtins.len());
        // Print in columns for readability
        let mut col = 0;
        for name in builtins {
            print!("  {name:<15}");
            col += 1;
            if col % 4 == 0 {
                println!();
            }
        }
        if col % 4 != 0 {
            println!();
        }
        println!();
    }

    if !user_defined.is_empty() {
        println!("User-defined values ({}):", user_defined.len());
        for (name, value) in user_defined {
            println!("  {name} = {value}");
        }
    }
}
