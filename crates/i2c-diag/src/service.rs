//! Builtin diagnostic endpoints over an [`I2cManager`].
//!
//! Handlers translate textual parameters into typed engine calls and
//! marshal results to JSON. Status codes: 200 success, 400 for
//! malformed or missing request parameters (rejected before reaching
//! the engine), 500 when the operation ran but failed at the
//! hardware or validation layer.

use std::cell::RefCell;
use std::rc::Rc;

use i2c_manager::{I2cManager, I2cTransport, DEFAULT_FREQUENCY};
use serde_json::{json, Value};
use tracing::debug;

use crate::endpoint::{
    CustomEndpoints, Endpoint, EndpointRegistry, ParamSpec, Params, Response,
};
use crate::params::{hex_byte_list, hex_param, int_param, MAX_READ_LEN};

/// The manager shared between handler closures.
///
/// `Rc<RefCell<_>>` matches the single-threaded cooperative model: the
/// registry invokes one handler at a time, and nothing here is `Send`.
pub type SharedManager<T> = Rc<RefCell<I2cManager<T>>>;

/// Registers the builtin diagnostic endpoints.
pub struct I2cDiag;

impl I2cDiag {
    /// Register every builtin route against `registry`.
    pub fn attach<T: I2cTransport + 'static>(
        manager: SharedManager<T>,
        registry: &mut dyn EndpointRegistry,
    ) {
        let m = manager.clone();
        registry.add_endpoint(
            Endpoint::new("/initI2C", move |p| handle_init(&mut m.borrow_mut(), p))
                .summary("Initialize I2C bus")
                .description("Initialize an I2C bus with specified pins and frequency")
                .params(vec![
                    ParamSpec::required_int("bus_id", "Bus ID (0 or 1)"),
                    ParamSpec::required_int("sda_pin", "SDA pin number"),
                    ParamSpec::required_int("scl_pin", "SCL pin number"),
                    ParamSpec::int("frequency", "Bus frequency in Hz (default 100000)"),
                ]),
        );

        let m = manager.clone();
        registry.add_endpoint(
            Endpoint::new("/scanI2C", move |p| handle_scan(&mut m.borrow_mut(), p))
                .summary("Scan I2C bus for devices")
                .description("Scan the specified I2C bus for responsive devices")
                .params(vec![ParamSpec::required_int("bus_id", "Bus ID to scan")]),
        );

        let m = manager.clone();
        registry.add_endpoint(
            Endpoint::new("/getI2CDevices", move |p| handle_devices(&m.borrow(), p))
                .summary("Get all known devices")
                .description("Get information about all known I2C devices"),
        );

        let m = manager.clone();
        registry.add_endpoint(
            Endpoint::new("/readI2C", move |p| handle_read(&mut m.borrow_mut(), p))
                .summary("Read register from device")
                .description("Read a register value from an I2C device")
                .params(vec![
                    ParamSpec::required_int("bus_id", "Bus ID"),
                    ParamSpec::required_str("device_addr", "Device address (hex format, e.g., '0x48')"),
                    ParamSpec::required_str("reg_addr", "Register address (hex format)"),
                ]),
        );

        let m = manager.clone();
        registry.add_endpoint(
            Endpoint::new("/writeI2C", move |p| handle_write(&mut m.borrow_mut(), p))
                .summary("Write register to device")
                .description("Write a value to a register on an I2C device")
                .params(vec![
                    ParamSpec::required_int("bus_id", "Bus ID"),
                    ParamSpec::required_str("device_addr", "Device address (hex format)"),
                    ParamSpec::required_str("reg_addr", "Register address (hex format)"),
                    ParamSpec::required_str("value", "Value to write (hex format)"),
                ]),
        );

        let m = manager.clone();
        registry.add_endpoint(
            Endpoint::new("/pingI2C", move |p| handle_ping(&mut m.borrow_mut(), p))
                .summary("Ping I2C device")
                .description("Check if an I2C device is responding")
                .params(vec![
                    ParamSpec::required_int("bus_id", "Bus ID"),
                    ParamSpec::required_str("device_addr", "Device address (hex format)"),
                ]),
        );

        let m = manager.clone();
        registry.add_endpoint(
            Endpoint::new("/readI2CBytes", move |p| handle_read_bytes(&mut m.borrow_mut(), p))
                .summary("Read multiple bytes from device")
                .description("Read multiple bytes from a register on an I2C device")
                .params(vec![
                    ParamSpec::required_int("bus_id", "Bus ID"),
                    ParamSpec::required_str("device_addr", "Device address (hex format)"),
                    ParamSpec::required_str("reg_addr", "Register address (hex format)"),
                    ParamSpec::required_int("length", "Number of bytes to read"),
                ]),
        );

        let m = manager;
        registry.add_endpoint(
            Endpoint::new("/writeI2CBytes", move |p| handle_write_bytes(&mut m.borrow_mut(), p))
                .summary("Write multiple bytes to device")
                .description("Write multiple bytes to a register on an I2C device")
                .params(vec![
                    ParamSpec::required_int("bus_id", "Bus ID"),
                    ParamSpec::required_str("device_addr", "Device address (hex format)"),
                    ParamSpec::required_str("reg_addr", "Register address (hex format)"),
                    ParamSpec::required_str("data", "Comma-separated hex values (e.g., '0x01,0x02,0x03')"),
                ]),
        );
    }

    /// Register the builtins, then let a specialized driver add its
    /// own routes.
    pub fn attach_with<T: I2cTransport + 'static>(
        manager: SharedManager<T>,
        registry: &mut dyn EndpointRegistry,
        extension: &mut dyn CustomEndpoints,
    ) {
        Self::attach(manager, registry);
        extension.register_custom_endpoints(registry);
    }
}

fn hex(value: u8) -> String {
    format!("0x{value:x}")
}

fn respond(body: Value, status: u16) -> Response {
    (body.to_string(), status)
}

fn bad_request(message: &str) -> Response {
    respond(json!({ "success": false, "error": message }), 400)
}

fn handle_init<T: I2cTransport>(manager: &mut I2cManager<T>, params: &Params) -> Response {
    let (Some(bus_id), Some(sda_pin), Some(scl_pin)) = (
        int_param::<u8>(params, "bus_id"),
        int_param::<u8>(params, "sda_pin"),
        int_param::<u8>(params, "scl_pin"),
    ) else {
        return bad_request("Missing required parameters");
    };
    let frequency = int_param::<u32>(params, "frequency").unwrap_or(DEFAULT_FREQUENCY);

    let mut body = json!({
        "bus_id": bus_id,
        "sda_pin": sda_pin,
        "scl_pin": scl_pin,
        "frequency": frequency,
    });
    match manager.init_bus(bus_id, sda_pin, scl_pin, frequency) {
        Ok(()) => {
            body["success"] = json!(true);
            respond(body, 200)
        }
        Err(error) => {
            body["success"] = json!(false);
            body["error"] = json!(error.to_string());
            respond(body, 500)
        }
    }
}

fn handle_scan<T: I2cTransport>(manager: &mut I2cManager<T>, params: &Params) -> Response {
    let Some(bus_id) = int_param::<u8>(params, "bus_id") else {
        return bad_request("Missing bus_id parameter");
    };

    match manager.scan_bus(bus_id) {
        Ok(addresses) => {
            let devices: Vec<Value> = addresses
                .iter()
                .map(|&address| json!({ "address": address, "address_hex": hex(address) }))
                .collect();
            debug!(bus = bus_id, count = addresses.len(), "scan endpoint served");
            respond(
                json!({
                    "success": true,
                    "bus_id": bus_id,
                    "device_count": addresses.len(),
                    "devices": devices,
                }),
                200,
            )
        }
        Err(error) => respond(
            json!({
                "success": false,
                "bus_id": bus_id,
                "device_count": 0,
                "devices": [],
                "error": error.to_string(),
            }),
            500,
        ),
    }
}

fn handle_devices<T: I2cTransport>(manager: &I2cManager<T>, _params: &Params) -> Response {
    let devices: Vec<Value> = manager
        .devices()
        .iter()
        .map(|device| {
            json!({
                "bus_id": device.bus_id,
                "address": device.address,
                "address_hex": hex(device.address),
                "name": device.name,
                "responsive": device.responsive,
                "last_seen": device.last_seen,
            })
        })
        .collect();
    respond(
        json!({
            "success": true,
            "device_count": devices.len(),
            "devices": devices,
        }),
        200,
    )
}

fn handle_read<T: I2cTransport>(manager: &mut I2cManager<T>, params: &Params) -> Response {
    let (Some(bus_id), Some(device_addr), Some(reg_addr)) = (
        int_param::<u8>(params, "bus_id"),
        hex_param(params, "device_addr"),
        hex_param(params, "reg_addr"),
    ) else {
        return bad_request("Missing required parameters");
    };

    let mut body = json!({
        "bus_id": bus_id,
        "device_addr": hex(device_addr),
        "reg_addr": hex(reg_addr),
    });
    match manager.read_register(bus_id, device_addr, reg_addr) {
        Ok(value) => {
            body["success"] = json!(true);
            body["value"] = json!(value);
            body["value_hex"] = json!(hex(value));
            respond(body, 200)
        }
        Err(error) => {
            body["success"] = json!(false);
            body["error"] = json!(error.to_string());
            respond(body, 500)
        }
    }
}

fn handle_write<T: I2cTransport>(manager: &mut I2cManager<T>, params: &Params) -> Response {
    let (Some(bus_id), Some(device_addr), Some(reg_addr), Some(value)) = (
        int_param::<u8>(params, "bus_id"),
        hex_param(params, "device_addr"),
        hex_param(params, "reg_addr"),
        hex_param(params, "value"),
    ) else {
        return bad_request("Missing required parameters");
    };

    let mut body = json!({
        "bus_id": bus_id,
        "device_addr": hex(device_addr),
        "reg_addr": hex(reg_addr),
        "value": hex(value),
    });
    match manager.write_register(bus_id, device_addr, reg_addr, value) {
        Ok(()) => {
            body["success"] = json!(true);
            respond(body, 200)
        }
        Err(error) => {
            body["success"] = json!(false);
            body["error"] = json!(error.to_string());
            respond(body, 500)
        }
    }
}

fn handle_ping<T: I2cTransport>(manager: &mut I2cManager<T>, params: &Params) -> Response {
    let (Some(bus_id), Some(device_addr)) = (
        int_param::<u8>(params, "bus_id"),
        hex_param(params, "device_addr"),
    ) else {
        return bad_request("Missing required parameters");
    };

    // A probe that could not run (bad bus, reserved address) just
    // reports the device as absent; the ping route always answers 200.
    let present = manager.is_device_present(bus_id, device_addr).unwrap_or(false);
    respond(
        json!({
            "success": true,
            "bus_id": bus_id,
            "device_addr": hex(device_addr),
            "present": present,
        }),
        200,
    )
}

fn handle_read_bytes<T: I2cTransport>(manager: &mut I2cManager<T>, params: &Params) -> Response {
    let (Some(bus_id), Some(device_addr), Some(reg_addr), Some(length)) = (
        int_param::<u8>(params, "bus_id"),
        hex_param(params, "device_addr"),
        hex_param(params, "reg_addr"),
        int_param::<usize>(params, "length"),
    ) else {
        return bad_request("Missing required parameters");
    };

    if length > MAX_READ_LEN {
        return bad_request("Length too large (max 64 bytes)");
    }

    let mut buffer = vec![0u8; length];
    let mut body = json!({
        "bus_id": bus_id,
        "device_addr": hex(device_addr),
        "reg_addr": hex(reg_addr),
        "length": length,
    });
    match manager.read_bytes(bus_id, device_addr, reg_addr, &mut buffer) {
        Ok(()) => {
            let data: Vec<String> = buffer.iter().map(|&byte| hex(byte)).collect();
            body["success"] = json!(true);
            body["data"] = json!(data);
            respond(body, 200)
        }
        Err(error) => {
            body["success"] = json!(false);
            body["error"] = json!(error.to_string());
            respond(body, 500)
        }
    }
}

fn handle_write_bytes<T: I2cTransport>(manager: &mut I2cManager<T>, params: &Params) -> Response {
    let (Some(bus_id), Some(device_addr), Some(reg_addr), Some(data)) = (
        int_param::<u8>(params, "bus_id"),
        hex_param(params, "device_addr"),
        hex_param(params, "reg_addr"),
        params.get("data"),
    ) else {
        return bad_request("Missing required parameters");
    };

    let bytes = hex_byte_list(data);
    if bytes.is_empty() {
        return bad_request("No valid data bytes provided");
    }

    let mut body = json!({
        "bus_id": bus_id,
        "device_addr": hex(device_addr),
        "reg_addr": hex(reg_addr),
        "bytes_written": bytes.len(),
    });
    match manager.write_bytes(bus_id, device_addr, reg_addr, &bytes) {
        Ok(()) => {
            body["success"] = json!(true);
            respond(body, 200)
        }
        Err(error) => {
            body["success"] = json!(false);
            body["error"] = json!(error.to_string());
            respond(body, 500)
        }
    }
}
