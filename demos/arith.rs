use chomsky::grammar::examples::make_arith;
use chomsky::parsers::cyk::CfgParser;

fn main() {
  let source = std::env::args()
    .nth(1)
    .unwrap_or_else(|| "( 1 + 2 ) * 3 + 4".to_string());

  let mut cfg = make_arith();
  cfg.normalize();
  eprintln!("Grammar:\n{}", cfg.to_pretty());

  let input: Vec<&str> = source.split_whitespace().collect();
  let parser = CfgParser::new(&cfg).unwrap();
  let forest = parser.parse(&input).unwrap();
  eprintln!("{} derivations", forest.len());

  for derivation in &forest {
    let tree = derivation.unwind();
    let value = tree.evaluate_with(|s: &&str| s.parse().unwrap_or(0));
    println!("{}", tree.to_dot());
    println!("// value: {}", value);
  }
}
