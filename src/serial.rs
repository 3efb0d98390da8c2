//! Serde integration support.

use std::fmt;

use serde::de::{Error, Unexpected, Visitor};
use serde::*;

fn i64_to_u64<'d, V: Visitor<'d>, E: Error>(v: V, n: i64) -> Result<V::Value, E> {
    if n >= 0 {
        v.visit_u64(n as u64)
    } else {
        Err(E::invalid_value(Unexpected::Signed(n), &v))
    }
}

/// Ignore deserialization errors and revert to default.
pub fn ignore_errors<'d, T: Deserialize<'d> + Default, D: Deserializer<'d>>(
    d: D,
) -> Result<T, D::Error> {
    use serde_json::Value;

    let v = Value::deserialize(d)?;
    Ok(T::deserialize(v).ok().unwrap_or_default())
}

/// Deserialize a maybe-string ID into a u64.
pub fn deserialize_id<'d, D: Deserializer<'d>>(d: D) -> Result<u64, D::Error> {
    struct IdVisitor;
    impl<'d> Visitor<'d> for IdVisitor {
        type Value = u64;

        fn expecting(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
            write!(fmt, "a u64 or parseable string")
        }

        fn visit_i64<E: Error>(self, v: i64) -> Result<u64, E> {
            i64_to_u64(self, v)
        }

        fn visit_u64<E: Error>(self, v: u64) -> Result<u64, E> {
            Ok(v)
        }

        fn visit_str<E: Error>(self, v: &str) -> Result<u64, E> {
            v.parse::<u64>()
                .map_err(|_| E::invalid_value(Unexpected::Str(v), &self))
        }
    }

    d.deserialize_any(IdVisitor)
}

/// Deserialize a maybe-string discriminator into a u16.
/// Also enforces 0 <= N <= 9999.
pub fn deserialize_discrim_opt<'d, D: Deserializer<'d>>(d: D) -> Result<Option<u16>, D::Error> {
    macro_rules! check {
        ($self:ident, $v:ident, $wrong:expr) => {
            if $v >= 0 && $v <= 9999 {
                Ok(Some($v as u16))
            } else {
                Err(E::invalid_value($wrong, &$self))
            }
        };
    }

    struct DiscrimVisitor;
    impl<'d> Visitor<'d> for DiscrimVisitor {
        type Value = Option<u16>;

        fn expecting(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
            write!(fmt, "a u16 in [0, 9999] or parseable string")
        }

        fn visit_i64<E: Error>(self, v: i64) -> Result<Self::Value, E> {
            check!(self, v, Unexpected::Signed(v))
        }

        #[allow(unused_comparisons)]
        fn visit_u64<E: Error>(self, v: u64) -> Result<Self::Value, E> {
            check!(self, v, Unexpected::Unsigned(v))
        }

        fn visit_str<E: Error>(self, v: &str) -> Result<Self::Value, E> {
            match v.parse::<u16>() {
                Ok(n) if n <= 9999 => Ok(Some(n)),
                _ => Err(E::invalid_value(Unexpected::Str(v), &self)),
            }
        }
    }

    d.deserialize_any(DiscrimVisitor)
}

pub fn deserialize_discrim<'d, D: Deserializer<'d>>(d: D) -> Result<u16, D::Error> {
    match deserialize_discrim_opt(d) {
        Ok(Some(result)) => Ok(result),
        Err(e) => Err(e),
        Ok(None) => Err(D::Error::missing_field("discriminator")),
    }
}
