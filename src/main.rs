use clap::Parser;

use flatpak_sourcegen::{cli::args::CliArgs, Sourcegen};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli_args: CliArgs = CliArgs::parse();

    let mut builder = Sourcegen::builder();
    if let Some(output_directory) = &cli_args.output_directory {
        builder = builder.output_directory(output_directory);
    }
    if let Some(cache_directory) = &cli_args.cache_directory {
        builder = builder.cache_directory(cache_directory);
    }
    if let Some(manifest) = &cli_args.manifest {
        builder = builder.manifest(manifest);
    }
    if let Some(repository) = cli_args.repository {
        builder = builder.upstream(repository);
    }
    let sourcegen = builder.try_build()?;

    if cli_args.clear_cache {
        sourcegen.clear_cache()?;
    }

    sourcegen.generate(cli_args.revision.as_deref())?;
    Ok(())
}
