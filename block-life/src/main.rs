use block_life::{BlockLayout, Settings, SimulationError, SimulationRunner};

struct Cli {
    dimension: usize,
    divisions: usize,
    iterations: usize,
}

/// Parse the three positional arguments `<dimensao> <divisoes>
/// <iteracoes>`. Non-numeric values are rejected as usage errors
/// instead of silently defaulting.
fn parse_args(args: &[String]) -> Result<Cli, String> {
    let usage = || format!("Uso: {} <dimensao> <divisoes> <iteracoes>", args[0]);
    if args.len() != 4 {
        return Err(usage());
    }
    let parse = |arg: &String| arg.parse::<usize>().map_err(|_| usage());
    Ok(Cli {
        dimension: parse(&args[1])?,
        divisions: parse(&args[2])?,
        iterations: parse(&args[3])?,
    })
}

fn run(cli: Cli) -> Result<(), SimulationError> {
    let layout = BlockLayout::new(cli.dimension, cli.divisions)?;
    let settings = Settings::with_available_parallelism(cli.iterations)?;
    let mut runner = SimulationRunner::new(layout, settings)?;

    println!("Estado inicial:");
    print!("{}", runner.build_initial()?);

    println!("Executando...\n");
    let final_grid = runner.simulate()?;

    println!("\nEstado final apos {} iteracoes:", cli.iterations);
    print!("{final_grid}");
    runner.finish()
}

fn main() {
    // Diagnostics go to stderr; stdout carries only the grid output.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(tracing::level_filters::LevelFilter::WARN.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let cli = match parse_args(&args) {
        Ok(cli) => cli,
        Err(usage) => {
            eprintln!("{usage}");
            std::process::exit(1);
        }
    };
    if let Err(error) = run(cli) {
        eprintln!("{error}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        std::iter::once("block-life")
            .chain(values.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn accepts_three_numeric_arguments() {
        let cli = parse_args(&args(&["20", "4", "10"])).unwrap();
        assert_eq!(cli.dimension, 20);
        assert_eq!(cli.divisions, 4);
        assert_eq!(cli.iterations, 10);
    }

    #[test]
    fn rejects_wrong_argument_count() {
        assert!(parse_args(&args(&[])).is_err());
        assert!(parse_args(&args(&["20", "4"])).is_err());
        assert!(parse_args(&args(&["20", "4", "10", "3"])).is_err());
    }

    #[test]
    fn rejects_non_numeric_arguments() {
        assert!(parse_args(&args(&["twenty", "4", "10"])).is_err());
        assert!(parse_args(&args(&["20", "-4", "10"])).is_err());
        assert!(parse_args(&args(&["20", "4", "1.5"])).is_err());
    }
}
