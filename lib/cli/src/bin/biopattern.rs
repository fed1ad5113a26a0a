use biopattern_cli::cli::biopattern_main;

fn main() {
    biopattern_main();
}
