//! The built-in indicator/function table (component E). `register_all`
//! wires every entry into a fresh [`Registry`](crate::registry::Registry);
//! see `DESIGN.md` for the handful of naming decisions this module makes
//! where the source material names a function twice with conflicting
//! arity.

mod bar_predicates;
mod reference;
mod recursive;
mod rolling;
mod scalar;
mod variadic;

use crate::registry::Registry;

pub fn register_all(registry: &mut Registry) {
  let r = registry;

  r.register("MA", &[], rolling::ma).unwrap();
  r.register("SUM", &[], rolling::sum).unwrap();
  r.register("COUNT", &[], rolling::count).unwrap();
  r.register("HHV", &[], rolling::hhv).unwrap();
  r.register("LLV", &[], rolling::llv).unwrap();
  r.register("HHVBARS", &[], rolling::hhvbars).unwrap();
  r.register("LLVBARS", &[], rolling::llvbars).unwrap();
  r.register("AVEDEV", &[], rolling::avedev).unwrap();
  r.register("DEVSQ", &[], rolling::devsq).unwrap();
  r.register("VAR", &[], rolling::var).unwrap();
  r.register("VARP", &[], rolling::varp).unwrap();
  r.register("STD", &[], rolling::std).unwrap();
  r.register("STDP", &[], rolling::stdp).unwrap();
  r.register("SLOPE", &[], rolling::slope).unwrap();
  r.register("FORCAST", &[], rolling::forcast).unwrap();
  r.register("TRMA", &[], rolling::trma).unwrap();
  r.register("TSMA", &[], rolling::tsma).unwrap();
  r.register("EXIST", &[], rolling::exist).unwrap();
  r.register("EVERY", &[], rolling::every).unwrap();

  r.register("EMA", &["EMA2"], recursive::ema).unwrap();
  r.register("SMA", &[], recursive::sma).unwrap();
  r.register("DMA", &[], recursive::dma).unwrap();

  r.register("REF", &[], reference::ref_).unwrap();
  r.register("CROSS", &[], reference::cross).unwrap();
  r.register("CROSSDOWN", &[], reference::crossdown).unwrap();
  r.register("BARSLAST", &[], reference::barslast).unwrap();
  r.register("VALUEWHEN", &[], reference::valuewhen).unwrap();
  r.register("LAST", &[], reference::last).unwrap();
  r.register("LONGCROSS", &[], reference::longcross).unwrap();
  r.register("FILTER", &[], reference::filter).unwrap();

  r.register("ABS", &[], scalar::abs).unwrap();
  r.register("ACOS", &[], scalar::acos).unwrap();
  r.register("ASIN", &[], scalar::asin).unwrap();
  r.register("ATAN", &[], scalar::atan).unwrap();
  r.register("SIN", &[], scalar::sin).unwrap();
  r.register("COS", &[], scalar::cos).unwrap();
  r.register("TAN", &[], scalar::tan).unwrap();
  r.register("EXP", &[], scalar::exp).unwrap();
  r.register("LN", &[], scalar::ln).unwrap();
  r.register("LOG", &[], scalar::log).unwrap();
  r.register("SQRT", &[], scalar::sqrt).unwrap();
  r.register("SQUARE", &[], scalar::square).unwrap();
  r.register("CUBE", &[], scalar::cube).unwrap();
  r.register("POW", &[], scalar::pow).unwrap();
  r.register("MOD", &[], scalar::modulo).unwrap();
  r.register("CEILING", &[], scalar::ceiling).unwrap();
  r.register("FLOOR", &[], scalar::floor).unwrap();
  r.register("INTPART", &[], scalar::intpart).unwrap();
  r.register("MAX2", &[], scalar::max2).unwrap();
  r.register("MIN2", &[], scalar::min2).unwrap();
  r.register("SGN", &[], scalar::sgn).unwrap();
  r.register("REVERSE", &[], scalar::reverse).unwrap();
  r.register("NOT", &[], scalar::not).unwrap();
  r.register("BETWEEN", &[], scalar::between).unwrap();
  r.register("RANGE", &[], scalar::range).unwrap();
  r.register("IFELSE", &["IFF"], scalar::ifelse).unwrap();

  r.register("MAX", &[], variadic::max).unwrap();
  r.register("MIN", &[], variadic::min).unwrap();
  r.register("PRINT", &[], variadic::print).unwrap();

  r.register("ISUP", &[], bar_predicates::isup).unwrap();
  r.register("ISDOWN", &[], bar_predicates::isdown).unwrap();
  r.register("ISEQUAL", &[], bar_predicates::isequal).unwrap();
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn registers_without_name_collisions() {
    let mut registry = Registry::empty();
    register_all(&mut registry);
    assert!(registry.get("MA").is_some());
    assert!(registry.get("EMA2").is_some());
    assert!(registry.get("IFF").is_some());
  }
}
