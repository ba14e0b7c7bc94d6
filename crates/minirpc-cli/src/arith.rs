//! Demo arithmetic service.
//!
//! Each function takes `data1` as the left operand and a single byte of
//! `data2` as the right operand, both read as signed 8-bit integers. Any
//! other `data2` shape is a handler failure. Results carry only `data1`.

use minirpc_common::protocol::error::Result;
use minirpc_common::RpcPayload;
use minirpc_server::Server;

/// Names and ids the demo service registers, in registration order.
pub const DEMO_FUNCTIONS: [&str; 3] = ["add2", "minus2", "times2"];

fn operands(input: &RpcPayload) -> Option<(i8, i8)> {
    match input.data2.as_deref() {
        Some([rhs]) => Some((input.data1 as i8, *rhs as i8)),
        _ => None,
    }
}

/// Adds two signed 8-bit numbers.
pub fn add2_i8(input: &RpcPayload) -> Option<RpcPayload> {
    let (lhs, rhs) = operands(input)?;
    tracing::debug!("add2: arguments {} and {}", lhs, rhs);
    Some(RpcPayload::new(lhs as i64 + rhs as i64))
}

/// Subtracts two signed 8-bit numbers.
pub fn minus2_i8(input: &RpcPayload) -> Option<RpcPayload> {
    let (lhs, rhs) = operands(input)?;
    tracing::debug!("minus2: arguments {} and {}", lhs, rhs);
    Some(RpcPayload::new(lhs as i64 - rhs as i64))
}

/// Multiplies two signed 8-bit numbers.
pub fn times2_i8(input: &RpcPayload) -> Option<RpcPayload> {
    let (lhs, rhs) = operands(input)?;
    tracing::debug!("times2: arguments {} and {}", lhs, rhs);
    Some(RpcPayload::new(lhs as i64 * rhs as i64))
}

/// Registers the demo functions on `server`.
pub fn register_demo_service(server: &mut Server) -> Result<()> {
    let [add2, minus2, times2] = DEMO_FUNCTIONS;
    server.register(add2, add2_i8)?;
    server.register(minus2, minus2_i8)?;
    server.register(times2, times2_i8)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(lhs: i64, rhs: u8) -> RpcPayload {
        RpcPayload::new(lhs).with_data2(vec![rhs])
    }

    #[test]
    fn test_add2() {
        assert_eq!(add2_i8(&args(5, 3)), Some(RpcPayload::new(8)));
        assert_eq!(add2_i8(&args(127, 127)), Some(RpcPayload::new(254)));
    }

    #[test]
    fn test_minus2_with_negative_byte() {
        // 0xfe is -2 as i8
        assert_eq!(minus2_i8(&args(5, 0xfe)), Some(RpcPayload::new(7)));
    }

    #[test]
    fn test_times2() {
        assert_eq!(times2_i8(&args(-4, 6)), Some(RpcPayload::new(-24)));
    }

    #[test]
    fn test_data1_truncated_to_i8() {
        // 258 wraps to 2
        assert_eq!(add2_i8(&args(258, 1)), Some(RpcPayload::new(3)));
    }

    #[test]
    fn test_register_demo_service_ids() {
        let config = minirpc_server::ServerConfig::new(0)
            .unwrap()
            .with_bind("127.0.0.1".parse().unwrap());
        let mut server = Server::bind(config).unwrap();
        register_demo_service(&mut server).unwrap();

        for (index, name) in DEMO_FUNCTIONS.iter().enumerate() {
            assert_eq!(server.registry().lookup_by_name(name) as usize, index + 1);
        }
    }

    #[test]
    fn test_wrong_data2_shape_fails() {
        assert_eq!(add2_i8(&RpcPayload::new(5)), None);
        assert_eq!(add2_i8(&RpcPayload::new(5).with_data2(vec![1, 2])), None);
        assert_eq!(times2_i8(&RpcPayload::new(5).with_data2(Vec::new())), None);
    }
}
