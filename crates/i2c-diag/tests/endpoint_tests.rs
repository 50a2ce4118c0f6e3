use std::cell::RefCell;
use std::rc::Rc;

use i2c_diag::{
    CustomEndpoints, Endpoint, EndpointRegistry, I2cDiag, ParamKind, Params,
};
use i2c_manager::mock::MockTransport;
use i2c_manager::I2cManager;
use serde_json::{json, Value};

// ---------------------------------------------------------------------------
// Mock registry
// ---------------------------------------------------------------------------

/// Captures registrations and lets tests invoke handlers directly.
#[derive(Default)]
struct RecordingRegistry {
    endpoints: Vec<Endpoint>,
}

impl EndpointRegistry for RecordingRegistry {
    fn add_endpoint(&mut self, endpoint: Endpoint) {
        self.endpoints.push(endpoint);
    }
}

impl RecordingRegistry {
    fn routes(&self) -> Vec<&'static str> {
        self.endpoints.iter().map(|e| e.route).collect()
    }

    fn call(&mut self, route: &str, entries: &[(&str, &str)]) -> (Value, u16) {
        let params: Params = entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let endpoint = self
            .endpoints
            .iter_mut()
            .find(|e| e.route == route)
            .expect("route registered");
        let (body, status) = endpoint.invoke(&params);
        (serde_json::from_str(&body).expect("handler returned JSON"), status)
    }
}

fn setup(devices: &[u8]) -> (RecordingRegistry, Rc<RefCell<I2cManager<MockTransport>>>) {
    let mut port0 = MockTransport::new();
    for &address in devices {
        port0.add_device(address);
    }
    let manager = Rc::new(RefCell::new(I2cManager::new([port0, MockTransport::new()])));
    let mut registry = RecordingRegistry::default();
    I2cDiag::attach(manager.clone(), &mut registry);
    (registry, manager)
}

const INIT0: &[(&str, &str)] =
    &[("bus_id", "0"), ("sda_pin", "21"), ("scl_pin", "22")];

// ---------------------------------------------------------------------------
// Registration metadata
// ---------------------------------------------------------------------------

#[test]
fn registers_all_builtin_routes() {
    let (registry, _manager) = setup(&[]);
    assert_eq!(
        registry.routes(),
        vec![
            "/initI2C",
            "/scanI2C",
            "/getI2CDevices",
            "/readI2C",
            "/writeI2C",
            "/pingI2C",
            "/readI2CBytes",
            "/writeI2CBytes",
        ]
    );

    let init = &registry.endpoints[0];
    assert_eq!(init.params.len(), 4);
    let frequency = &init.params[3];
    assert_eq!(frequency.name, "frequency");
    assert!(!frequency.required);
    assert_eq!(frequency.kind, ParamKind::Int);

    let read_bytes = &registry.endpoints[6];
    let length = &read_bytes.params[3];
    assert_eq!(length.name, "length");
    assert!(length.required);
    assert_eq!(length.kind, ParamKind::Int);
}

// ---------------------------------------------------------------------------
// /initI2C
// ---------------------------------------------------------------------------

#[test]
fn init_success_echoes_configuration() {
    let (mut registry, manager) = setup(&[]);
    let (body, status) = registry.call(
        "/initI2C",
        &[("bus_id", "0"), ("sda_pin", "21"), ("scl_pin", "22"), ("frequency", "400000")],
    );
    assert_eq!(status, 200);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["bus_id"], json!(0));
    assert_eq!(body["frequency"], json!(400_000));
    assert!(manager.borrow().is_bus_initialized(0));
}

#[test]
fn init_defaults_frequency() {
    let (mut registry, manager) = setup(&[]);
    let (body, status) = registry.call("/initI2C", INIT0);
    assert_eq!(status, 200);
    assert_eq!(body["frequency"], json!(100_000));
    assert_eq!(manager.borrow().bus_config(0).unwrap().frequency, 100_000);
}

#[test]
fn init_missing_params_is_400() {
    let (mut registry, _manager) = setup(&[]);
    let (body, status) =
        registry.call("/initI2C", &[("bus_id", "0"), ("sda_pin", "21")]);
    assert_eq!(status, 400);
    assert_eq!(body["error"], json!("Missing required parameters"));
}

#[test]
fn init_unsupported_bus_is_500() {
    let (mut registry, _manager) = setup(&[]);
    let (body, status) = registry.call(
        "/initI2C",
        &[("bus_id", "5"), ("sda_pin", "21"), ("scl_pin", "22")],
    );
    assert_eq!(status, 500);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"], json!("Invalid parameters"));
}

#[test]
fn init_transport_failure_is_500() {
    let mut port0 = MockTransport::new();
    port0.fail_begin(true);
    let manager = Rc::new(RefCell::new(I2cManager::new([port0, MockTransport::new()])));
    let mut registry = RecordingRegistry::default();
    I2cDiag::attach(manager.clone(), &mut registry);

    let (body, status) = registry.call("/initI2C", INIT0);
    assert_eq!(status, 500);
    assert_eq!(body["error"], json!("Other error"));
}

// ---------------------------------------------------------------------------
// /scanI2C and /getI2CDevices
// ---------------------------------------------------------------------------

#[test]
fn scan_requires_initialized_bus() {
    let (mut registry, _manager) = setup(&[0x48]);
    let (body, status) = registry.call("/scanI2C", &[("bus_id", "0")]);
    assert_eq!(status, 500);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["device_count"], json!(0));
    assert_eq!(body["error"], json!("Bus not initialized"));
}

#[test]
fn scan_lists_found_addresses() {
    let (mut registry, _manager) = setup(&[0x48, 0x76]);
    registry.call("/initI2C", INIT0);

    let (body, status) = registry.call("/scanI2C", &[("bus_id", "0")]);
    assert_eq!(status, 200);
    assert_eq!(body["device_count"], json!(2));
    assert_eq!(body["devices"][0]["address"], json!(0x48));
    assert_eq!(body["devices"][0]["address_hex"], json!("0x48"));
    assert_eq!(body["devices"][1]["address_hex"], json!("0x76"));
}

#[test]
fn scan_missing_bus_id_is_400() {
    let (mut registry, _manager) = setup(&[]);
    let (body, status) = registry.call("/scanI2C", &[]);
    assert_eq!(status, 400);
    assert_eq!(body["error"], json!("Missing bus_id parameter"));
}

#[test]
fn device_listing_reflects_registry() {
    let (mut registry, manager) = setup(&[0x48]);
    registry.call("/initI2C", INIT0);
    registry.call("/scanI2C", &[("bus_id", "0")]);

    // Device drops off the bus; a rescan marks it unresponsive but
    // keeps the record.
    manager.borrow_mut().port(0).unwrap().remove_device(0x48);
    registry.call("/scanI2C", &[("bus_id", "0")]);

    let (body, status) = registry.call("/getI2CDevices", &[]);
    assert_eq!(status, 200);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["device_count"], json!(1));
    let device = &body["devices"][0];
    assert_eq!(device["bus_id"], json!(0));
    assert_eq!(device["address_hex"], json!("0x48"));
    assert_eq!(device["name"], json!("Unknown Device"));
    assert_eq!(device["responsive"], json!(false));
    assert!(device["last_seen"].is_u64());
}

// ---------------------------------------------------------------------------
// /readI2C, /writeI2C, /pingI2C
// ---------------------------------------------------------------------------

#[test]
fn write_then_read_round_trip() {
    let (mut registry, _manager) = setup(&[0x48]);
    registry.call("/initI2C", INIT0);

    let (body, status) = registry.call(
        "/writeI2C",
        &[("bus_id", "0"), ("device_addr", "0x48"), ("reg_addr", "0x10"), ("value", "0xa5")],
    );
    assert_eq!(status, 200);
    assert_eq!(body["value"], json!("0xa5"));

    let (body, status) = registry.call(
        "/readI2C",
        &[("bus_id", "0"), ("device_addr", "0x48"), ("reg_addr", "0x10")],
    );
    assert_eq!(status, 200);
    assert_eq!(body["value"], json!(0xA5));
    assert_eq!(body["value_hex"], json!("0xa5"));
}

#[test]
fn read_from_absent_device_is_500_with_nack() {
    let (mut registry, _manager) = setup(&[]);
    registry.call("/initI2C", INIT0);

    let (body, status) = registry.call(
        "/readI2C",
        &[("bus_id", "0"), ("device_addr", "0x48"), ("reg_addr", "0x00")],
    );
    assert_eq!(status, 500);
    assert_eq!(body["error"], json!("NACK on address"));
}

#[test]
fn ping_always_answers_200() {
    let (mut registry, _manager) = setup(&[0x48]);

    // Uninitialized bus: the probe cannot run, so the device is
    // simply reported absent.
    let (body, status) =
        registry.call("/pingI2C", &[("bus_id", "0"), ("device_addr", "0x48")]);
    assert_eq!(status, 200);
    assert_eq!(body["present"], json!(false));

    registry.call("/initI2C", INIT0);
    let (body, _) =
        registry.call("/pingI2C", &[("bus_id", "0"), ("device_addr", "0x48")]);
    assert_eq!(body["present"], json!(true));
    let (body, _) =
        registry.call("/pingI2C", &[("bus_id", "0"), ("device_addr", "0x50")]);
    assert_eq!(body["present"], json!(false));
}

// ---------------------------------------------------------------------------
// /readI2CBytes and /writeI2CBytes
// ---------------------------------------------------------------------------

#[test]
fn bulk_read_rejects_oversized_length() {
    let (mut registry, _manager) = setup(&[0x48]);
    registry.call("/initI2C", INIT0);

    let (body, status) = registry.call(
        "/readI2CBytes",
        &[("bus_id", "0"), ("device_addr", "0x48"), ("reg_addr", "0x00"), ("length", "100")],
    );
    assert_eq!(status, 400);
    assert_eq!(body["error"], json!("Length too large (max 64 bytes)"));
}

#[test]
fn bulk_write_then_read() {
    let (mut registry, manager) = setup(&[0x48]);
    registry.call("/initI2C", INIT0);

    let (body, status) = registry.call(
        "/writeI2CBytes",
        &[
            ("bus_id", "0"),
            ("device_addr", "0x48"),
            ("reg_addr", "0x10"),
            // One empty segment and surrounding whitespace must not
            // bother the parser.
            ("data", "0x01, 0x02,,0x03"),
        ],
    );
    assert_eq!(status, 200);
    assert_eq!(body["bytes_written"], json!(3));
    assert_eq!(manager.borrow_mut().port(0).unwrap().register(0x48, 0x12), 0x03);

    let (body, status) = registry.call(
        "/readI2CBytes",
        &[("bus_id", "0"), ("device_addr", "0x48"), ("reg_addr", "0x10"), ("length", "3")],
    );
    assert_eq!(status, 200);
    assert_eq!(body["data"], json!(["0x1", "0x2", "0x3"]));
}

#[test]
fn bulk_write_with_no_parsable_bytes_is_400() {
    let (mut registry, _manager) = setup(&[0x48]);
    registry.call("/initI2C", INIT0);

    let (body, status) = registry.call(
        "/writeI2CBytes",
        &[("bus_id", "0"), ("device_addr", "0x48"), ("reg_addr", "0x10"), ("data", ",, ,")],
    );
    assert_eq!(status, 400);
    assert_eq!(body["error"], json!("No valid data bytes provided"));
}

// ---------------------------------------------------------------------------
// Custom endpoint extension
// ---------------------------------------------------------------------------

struct VersionExtension;

impl CustomEndpoints for VersionExtension {
    fn register_custom_endpoints(&mut self, registry: &mut dyn EndpointRegistry) {
        registry.add_endpoint(
            Endpoint::new("/sensorVersion", |_params| {
                (json!({ "success": true, "version": "1.0" }).to_string(), 200)
            })
            .summary("Sensor firmware version"),
        );
    }
}

#[test]
fn extension_routes_register_after_builtins() {
    let manager = Rc::new(RefCell::new(I2cManager::new([
        MockTransport::new(),
        MockTransport::new(),
    ])));
    let mut registry = RecordingRegistry::default();
    I2cDiag::attach_with(manager, &mut registry, &mut VersionExtension);

    assert_eq!(registry.endpoints.len(), 9);
    let (body, status) = registry.call("/sensorVersion", &[]);
    assert_eq!(status, 200);
    assert_eq!(body["version"], json!("1.0"));
}
