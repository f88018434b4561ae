pub const CDN_JSON: &str = r#"[
  {"client_id": 829449, "client_name": "Northwind Hosting", "feature": "Traffic", "metric_value": 1532.75, "unit": "GB", "comment": null},
  {"client_id": 829449, "client_name": "Northwind Hosting", "feature": "Requests", "metric_value": 0, "unit": "requests", "comment": ""},
  {"client_id": 829449, "client_name": "Northwind Hosting", "feature": "Shielding", "metric_value": "12", "unit": "GB", "tags": []},
  {"client_id": 771203, "client_name": "Blue Finch Media", "feature": "Traffic", "metric_value": 88.1, "unit": "GB", "comment": "trial"}
]"#;

pub const WAAP_JSON: &str = r#"{
  "data": [
    {"clientId": "829449", "clientName": "Northwind Hosting", "feature": "WAAP Pro", "metricValue": 1, "unit": "domains", "meta": {}},
    {"clientId": "829449", "clientName": "Northwind Hosting", "feature": "API discovery", "metricValue": 0, "unit": "domains", "meta": {"tier": null}},
    {"clientId": "771203", "clientName": "Blue Finch Media", "feature": "WAAP Pro", "metricValue": 2, "unit": "domains"}
  ],
  "total": 3
}"#;

pub const CLOUD_CSV: &str = "\
Client ID,Client name,Feature,Region,Metric name,Metric value,Unit,Date from,Date to
829449,Northwind Hosting,Instances: g1-standard-2-4,Luxembourg,Instance hours,\"1,104\",hours,2025-09-01,2025-09-24
829449,Northwind Hosting,Volumes: standard,Luxembourg,Volume GB-hours,0,GB*h,2025-09-01,2025-09-24
829449,Northwind Hosting,Floating IP,Amsterdam,IP hours,552,hours,2025-09-01,2025-09-24
829449,Northwind Hosting,Snapshots,Luxembourg,Snapshot GB-hours,,GB*h,2025-09-01,2025-09-24
771203,Blue Finch Media,Instances: g1-standard-1-2,Frankfurt,Instance hours,576,hours,2025-09-01,2025-09-24
829449,Northwind Hosting,Load balancers,Luxembourg,LB hours,0.00,hours,2025-09-01,2025-09-24
";
