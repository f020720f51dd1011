//! Folding streamed partial outputs

use serde_json::{Number, Value};

/// A partial output that can absorb the next partial output
///
/// Generator lambdas use this to turn a sequence of chunks into the single
/// value returned by `invoke`.
pub trait Accumulate {
    fn accumulate(self, next: Self) -> Self;
}

impl Accumulate for String {
    fn accumulate(mut self, next: Self) -> Self {
        self.push_str(&next);
        self
    }
}

impl<T> Accumulate for Vec<T> {
    fn accumulate(mut self, next: Self) -> Self {
        self.extend(next);
        self
    }
}

/// Integers saturate at their bounds instead of overflowing
macro_rules! accumulate_by_saturating_addition {
    ($($ty:ty),*) => {
        $(
            impl Accumulate for $ty {
                fn accumulate(self, next: Self) -> Self {
                    self.saturating_add(next)
                }
            }
        )*
    };
}

accumulate_by_saturating_addition!(i32, i64, u32, u64, usize);

impl Accumulate for f32 {
    fn accumulate(self, next: Self) -> Self {
        self + next
    }
}

impl Accumulate for f64 {
    fn accumulate(self, next: Self) -> Self {
        self + next
    }
}

/// Dynamic values merge by shape: strings concatenate, numbers add, arrays
/// append, objects merge key by key. Anything else is replaced by the newer
/// chunk.
impl Accumulate for Value {
    fn accumulate(self, next: Self) -> Self {
        match (self, next) {
            (Value::String(mut a), Value::String(b)) => {
                a.push_str(&b);
                Value::String(a)
            }
            (Value::Array(mut a), Value::Array(b)) => {
                a.extend(b);
                Value::Array(a)
            }
            (Value::Object(mut a), Value::Object(b)) => {
                for (key, value) in b {
                    let merged = match a.remove(&key) {
                        Some(existing) => existing.accumulate(value),
                        None => value,
                    };
                    a.insert(key, merged);
                }
                Value::Object(a)
            }
            (Value::Number(a), Value::Number(b)) => add_numbers(a, b),
            (_, next) => next,
        }
    }
}

/// Exact integer sum while it fits in `i64` or `u64`, otherwise the `f64` sum
fn add_numbers(a: Number, b: Number) -> Value {
    if let Some(sum) = a.as_i64().zip(b.as_i64()).and_then(|(x, y)| x.checked_add(y)) {
        return Value::from(sum);
    }
    if let Some(sum) = a.as_u64().zip(b.as_u64()).and_then(|(x, y)| x.checked_add(y)) {
        return Value::from(sum);
    }
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => Value::from(x + y),
        _ => Value::Number(b),
    }
}
