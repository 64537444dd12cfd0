//! Small grammars used by tests and demos. Inputs are string slices, and
//! values are integers.

use crate::grammar::{build, Cfg, DynamicRule, Token};

pub type ExampleCfg = Cfg<&'static str, i64>;

/// `<sum> -> <sum> + <sum> | 1 | 2`, evaluating to the sum.
pub fn make_sum() -> ExampleCfg {
  let sum = Token::variable("sum");
  let plus = Token::terminal("+");
  let one = Token::terminal("1");
  let two = Token::terminal("2");

  build(|b| {
    b.add_rule(&sum, &[&sum, &plus, &sum], |args: Vec<i64>| {
      args[0] + args[2]
    })
    .add_rule(&sum, &[&one], |_| 1)
    .add_rule(&sum, &[&two], |_| 2);
  })
  .expect("fixture grammars are well formed")
}

/// `<a> -> x <a> | ε`, evaluating to the number of `x`s.
pub fn make_optional() -> ExampleCfg {
  let a = Token::variable("a");
  let x = Token::terminal("x");

  build(|b| {
    b.add_rule(&a, &[&x, &a], |args: Vec<i64>| args[1] + 1)
      .add_rule(&a, &[], |_| 0);
  })
  .expect("fixture grammars are well formed")
}

/// `<q> -> <p> <p>`, `<p> -> <r> | a`, `<r> -> ε`, evaluating to the number
/// of `a`s.
pub fn make_nullable_chain() -> ExampleCfg {
  let q = Token::variable("q");
  let p = Token::variable("p");
  let r = Token::variable("r");
  let a = Token::terminal("a");

  build(|b| {
    b.add_rule(&q, &[&p, &p], |args: Vec<i64>| args[0] + args[1])
      .add_passthrough(&p, &r)
      .add_rule(&p, &[&a], |_| 1)
      .add_rule(&r, &[], |_| 0);
  })
  .expect("fixture grammars are well formed")
}

/// `<a> -> <b>`, `<b> -> c`. The unit rule adds 100 to the value of `<b>`.
pub fn make_unit_chain() -> ExampleCfg {
  let a = Token::variable("a");
  let b = Token::variable("b");
  let c = Token::terminal("c");

  build(|gb| {
    gb.add_rule(&a, &[&b], |args: Vec<i64>| args[0] + 100)
      .add_rule(&b, &[&c], |_| 1);
  })
  .expect("fixture grammars are well formed")
}

/// `<a> -> w x y z v`, evaluating to the number of children it is given.
pub fn make_long() -> ExampleCfg {
  let a = Token::variable("a");
  let rhs: Vec<_> = ["w", "x", "y", "z", "v"]
    .iter()
    .map(|name| Token::terminal(name))
    .collect();
  let rhs_refs: Vec<_> = rhs.iter().collect();

  build(|b| {
    b.add_rule(&a, &rhs_refs, |args| args.len() as i64);
  })
  .expect("fixture grammars are well formed")
}

/// `<s> -> <p> | <q>`, `<p> -> a b c d`, `<q> -> e c d`. The two longer
/// rules end in the same two symbols.
pub fn make_shared_suffix() -> ExampleCfg {
  let s = Token::variable("s");
  let p = Token::variable("p");
  let q = Token::variable("q");
  let [a, b, c, d, e] = ["a", "b", "c", "d", "e"].map(Token::terminal);

  build(|gb| {
    gb.add_passthrough(&s, &p)
      .add_passthrough(&s, &q)
      .add_rule(&p, &[&a, &b, &c, &d], |args| args.len() as i64)
      .add_rule(&q, &[&e, &c, &d], |args| args.len() as i64);
  })
  .expect("fixture grammars are well formed")
}

/// Reads the values of the children as the digits of a decimal number, so
/// that a missing child shows up as a zero in its position.
fn digits(args: Vec<i64>) -> i64 {
  args.iter().fold(0, |number, digit| number * 10 + digit)
}

/// `<a> -> x <n> y z`, `<n> -> n | ε`. The long rule reads its children as
/// digits.
pub fn make_nullable_long() -> ExampleCfg {
  let a = Token::variable("a");
  let n = Token::variable("n");
  let [x, y, z] = ["x", "y", "z"].map(Token::terminal);

  build(|gb| {
    gb.add_rule(&a, &[&x, &n, &y, &z], digits)
      .add_passthrough(&n, Token::terminal("n"))
      .add_rule(&n, &[], |_| 0);
  })
  .expect("fixture grammars are well formed")
}

/// `<t> -> <n> <n> <n>`, `<n> -> n | ε`. The rule reads its children as
/// digits.
pub fn make_nullable_run() -> ExampleCfg {
  let t = Token::variable("t");
  let n = Token::variable("n");

  build(|gb| {
    gb.add_rule(&t, &[&n, &n, &n], digits)
      .add_passthrough(&n, Token::terminal("n"))
      .add_rule(&n, &[], |_| 0);
  })
  .expect("fixture grammars are well formed")
}

/// `<s> -> <p> | <q>`, `<p> -> a <b> <c>`, `<q> -> d <b> <c>`, where `<b>`
/// and `<c>` derive `b` and `c` or nothing. The two rules end in the same
/// nullable pair, and read their children as digits.
pub fn make_nullable_suffix() -> ExampleCfg {
  let s = Token::variable("s");
  let p = Token::variable("p");
  let q = Token::variable("q");
  let b = Token::variable("b");
  let c = Token::variable("c");

  build(|gb| {
    gb.add_passthrough(&s, &p)
      .add_passthrough(&s, &q)
      .add_rule(&p, &[&Token::terminal("a"), &b, &c], digits)
      .add_rule(&q, &[&Token::terminal("d"), &b, &c], digits)
      .add_passthrough(&b, Token::terminal("b"))
      .add_rule(&b, &[], |_| 0)
      .add_passthrough(&c, Token::terminal("c"))
      .add_rule(&c, &[], |_| 0);
  })
  .expect("fixture grammars are well formed")
}

/// Integer arithmetic with `+`, `*` and parentheses. Numbers are matched by
/// a dynamic rule, and take their value from the leaf function given to
/// `evaluate_with`.
pub fn make_arith<'a>() -> Cfg<&'a str, i64> {
  let expr = Token::variable("expr");
  let term = Token::variable("term");
  let factor = Token::variable("factor");
  let number = Token::variable("number");
  let plus = Token::terminal("+");
  let times = Token::terminal("*");
  let open = Token::terminal("(");
  let close = Token::terminal(")");

  build(|b| {
    b.add_rule(&expr, &[&expr, &plus, &term], |args: Vec<i64>| {
      args[0] + args[2]
    })
    .add_passthrough(&expr, &term)
    .add_rule(&term, &[&term, &times, &factor], |args: Vec<i64>| {
      args[0] * args[2]
    })
    .add_passthrough(&term, &factor)
    .add_rule(&factor, &[&open, &expr, &close], |args: Vec<i64>| args[1])
    .add_passthrough(&factor, &number)
    .add_dynamic(DynamicRule::unary(&number, "integer", |s: &&str| {
      s.parse::<i64>().is_ok()
    }));
  })
  .expect("fixture grammars are well formed")
}
