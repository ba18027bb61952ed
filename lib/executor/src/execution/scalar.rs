use crate::{
    response::value::Value,
    schema::definition::{BOOLEAN_SCALAR, FLOAT_SCALAR, ID_SCALAR, INT_SCALAR, STRING_SCALAR},
};

/// Result coercion of a leaf value. Custom scalars pass through unchanged.
pub(crate) fn serialize_scalar(type_name: &str, value: Value) -> Result<Value, String> {
    match type_name {
        STRING_SCALAR => serialize_string(value),
        INT_SCALAR => serialize_int(value),
        FLOAT_SCALAR => serialize_float(value),
        BOOLEAN_SCALAR => serialize_boolean(value),
        ID_SCALAR => serialize_id(value),
        _ => Ok(value),
    }
}

fn serialize_string(value: Value) -> Result<Value, String> {
    match value {
        Value::String(_) => Ok(value),
        Value::Boolean(b) => Ok(Value::String(b.to_string())),
        Value::Int(i) => Ok(Value::String(i.to_string())),
        Value::Float(f) if f.is_finite() => Ok(Value::String(f.to_string())),
        other => Err(format!("String cannot represent value: {}", other)),
    }
}

fn serialize_int(value: Value) -> Result<Value, String> {
    let number = match &value {
        Value::Boolean(b) => return Ok(Value::Int(i64::from(*b))),
        Value::Int(i) => *i as f64,
        Value::Float(f) => *f,
        Value::String(s) => match s.trim().parse::<f64>() {
            Ok(n) if !s.trim().is_empty() => n,
            _ => return Err(format!("Int cannot represent non-integer value: {}", value)),
        },
        _ => return Err(format!("Int cannot represent non-integer value: {}", value)),
    };

    if !number.is_finite() || number.fract() != 0.0 {
        return Err(format!("Int cannot represent non-integer value: {}", value));
    }
    if number < i32::MIN as f64 || number > i32::MAX as f64 {
        return Err(format!(
            "Int cannot represent non 32-bit signed integer value: {}",
            value
        ));
    }
    Ok(Value::Int(number as i64))
}

fn serialize_float(value: Value) -> Result<Value, String> {
    let number = match &value {
        Value::Boolean(b) => return Ok(Value::Float(if *b { 1.0 } else { 0.0 })),
        Value::Int(i) => *i as f64,
        Value::Float(f) => *f,
        Value::String(s) if !s.trim().is_empty() => s.trim().parse::<f64>().unwrap_or(f64::NAN),
        _ => f64::NAN,
    };

    if number.is_finite() {
        Ok(Value::Float(number))
    } else {
        Err(format!("Float cannot represent non numeric value: {}", value))
    }
}

fn serialize_boolean(value: Value) -> Result<Value, String> {
    match value {
        Value::Boolean(_) => Ok(value),
        Value::Int(i) => Ok(Value::Boolean(i != 0)),
        Value::Float(f) if f.is_finite() => Ok(Value::Boolean(f != 0.0)),
        other => Err(format!(
            "Boolean cannot represent a non boolean value: {}",
            other
        )),
    }
}

fn serialize_id(value: Value) -> Result<Value, String> {
    match value {
        Value::String(_) => Ok(value),
        Value::Int(i) => Ok(Value::String(i.to_string())),
        Value::Float(f) if f.is_finite() && f.fract() == 0.0 => {
            Ok(Value::String((f as i64).to_string()))
        }
        other => Err(format!("ID cannot represent value: {}", other)),
    }
}
