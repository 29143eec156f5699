#![allow(dead_code)]

pub mod temp_files {
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Writes `content` to a fresh `.yaml` file that is removed when dropped
    pub fn create_temp_yaml(content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new()
            .prefix("microversion_test_")
            .suffix(".yaml")
            .tempfile()
            .unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }
}

pub mod fixtures {
    use microversion::{
        Dispatcher, HandlerRequest, HandlerResponse, Negotiator, RegistryBuilder, VersionRange,
    };
    use http::Method;
    use serde_json::json;

    pub const VERSION_HEADER: &str = "X-OpenStack-Compute-API-Version";

    pub fn range(min: &str, max: &str) -> VersionRange {
        VersionRange::parse(min, max).unwrap()
    }

    /// Service with envelope [2.1, 3.5]:
    /// - `microversions:index` bound to [2.1, 2.1] (`val`) and [2.2, 2.3] (`val2`)
    /// - `microversions2:index` bound to [2.2, 3.0] (200) and [3.1, 3.1] (202)
    pub fn compute_dispatcher() -> Dispatcher {
        let mut builder = RegistryBuilder::new();
        builder
            .register("microversions:index", range("2.1", "2.1"), |_req| {
                HandlerResponse::json(200, json!({ "param": "val" }))
            })
            .unwrap()
            .register("microversions:index", range("2.2", "2.3"), |_req| {
                HandlerResponse::json(200, json!({ "param": "val2" }))
            })
            .unwrap()
            .register("microversions2:index", range("2.2", "3.0"), |_req| {
                HandlerResponse::json(200, json!({ "param": "controller2_val1" }))
            })
            .unwrap()
            .register("microversions2:index", range("3.1", "3.1"), |_req| {
                HandlerResponse::json(202, json!({ "param": "controller2_val2" }))
            })
            .unwrap();
        Dispatcher::new(Negotiator::new(range("2.1", "3.5")), builder.seal())
    }

    /// Request for `action`, with the version header set when `version` is given
    pub fn request(action: &str, version: Option<&str>) -> HandlerRequest {
        let req = HandlerRequest::new(Method::GET, "/v2/fake/microversions", action);
        match version {
            Some(v) => req.with_header(VERSION_HEADER, v),
            None => req,
        }
    }

    pub const SERVICE_YAML: &str = r#"
versioning:
  min_version: "2.1"
  max_version: "3.5"
resources:
  - action: "microversions:index"
    bindings:
      - min_version: "2.1"
        max_version: "2.1"
        body: { param: val }
      - min_version: "2.2"
        max_version: "2.3"
        body: { param: val2 }
  - action: "microversions2:index"
    bindings:
      - min_version: "2.2"
        max_version: "3.0"
        body: { param: controller2_val1 }
      - min_version: "3.1"
        max_version: "3.1"
        status: 202
        body: { param: controller2_val2 }
"#;
}
