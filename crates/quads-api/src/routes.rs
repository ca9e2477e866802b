//! Route table for the QUADS API.
//!
//! Each function maps one logical operation to the [`Endpoint`] it is served
//! by. Paths are relative to the API base URL.

use quads_core::{path_segment, Endpoint, QueryParams};
use std::fmt::Display;

// Hosts

/// `GET hosts`
#[must_use]
pub fn get_hosts() -> Endpoint {
    Endpoint::get("hosts")
}

/// `GET hosts?group_by=model`
#[must_use]
pub fn get_host_models() -> Endpoint {
    Endpoint::get(QueryParams::new().with("group_by", "model").append_to("hosts"))
}

/// `GET hosts?{filters}`
#[must_use]
pub fn filter_hosts(filters: &QueryParams) -> Endpoint {
    Endpoint::get(filters.append_to("hosts"))
}

/// `GET hosts/{hostname}`
#[must_use]
pub fn get_host(hostname: &str) -> Endpoint {
    Endpoint::get(format!("hosts/{}", path_segment(hostname)))
}

/// `POST hosts`
#[must_use]
pub fn create_host() -> Endpoint {
    Endpoint::post("hosts")
}

/// `PATCH hosts/{hostname}`
#[must_use]
pub fn update_host(hostname: &str) -> Endpoint {
    Endpoint::patch(format!("hosts/{}", path_segment(hostname)))
}

/// `DELETE hosts/{hostname}`
#[must_use]
pub fn remove_host(hostname: &str) -> Endpoint {
    Endpoint::delete(format!("hosts/{}", path_segment(hostname)))
}

/// `GET available/{hostname}?{filters}`
#[must_use]
pub fn is_available(hostname: &str, filters: &QueryParams) -> Endpoint {
    Endpoint::get(filters.append_to(&format!("available/{}", path_segment(hostname))))
}

// Clouds

/// `GET clouds`
#[must_use]
pub fn get_clouds() -> Endpoint {
    Endpoint::get("clouds")
}

/// `GET clouds?{filters}`
#[must_use]
pub fn filter_clouds(filters: &QueryParams) -> Endpoint {
    Endpoint::get(filters.append_to("clouds"))
}

/// `GET clouds/free/`
#[must_use]
pub fn get_free_clouds() -> Endpoint {
    Endpoint::get("clouds/free/")
}

/// `GET clouds?name={cloud_name}`
#[must_use]
pub fn get_cloud(cloud_name: &str) -> Endpoint {
    Endpoint::get(QueryParams::new().with("name", cloud_name).append_to("clouds"))
}

/// `GET clouds/summary[?{filters}]`
#[must_use]
pub fn get_summary(filters: &QueryParams) -> Endpoint {
    Endpoint::get(filters.append_nonempty_to("clouds/summary"))
}

/// `POST clouds`
#[must_use]
pub fn insert_cloud() -> Endpoint {
    Endpoint::post("clouds")
}

/// `PATCH clouds/{cloud_name}`
#[must_use]
pub fn update_cloud(cloud_name: &str) -> Endpoint {
    Endpoint::patch(format!("clouds/{}", path_segment(cloud_name)))
}

/// `DELETE clouds/{cloud_name}`
#[must_use]
pub fn remove_cloud(cloud_name: &str) -> Endpoint {
    Endpoint::delete(format!("clouds/{}", path_segment(cloud_name)))
}

// Schedules

/// `GET schedules[?{filters}]`
#[must_use]
pub fn get_schedules(filters: &QueryParams) -> Endpoint {
    Endpoint::get(filters.append_nonempty_to("schedules"))
}

/// `GET schedules/current[?{filters}]`
#[must_use]
pub fn get_current_schedules(filters: &QueryParams) -> Endpoint {
    Endpoint::get(filters.append_nonempty_to("schedules/current"))
}

/// `GET schedules/future[?{filters}]`
#[must_use]
pub fn get_future_schedules(filters: &QueryParams) -> Endpoint {
    Endpoint::get(filters.append_nonempty_to("schedules/future"))
}

/// `GET schedules/{id}`
#[must_use]
pub fn get_schedule(schedule_id: impl Display) -> Endpoint {
    Endpoint::get(format!("schedules/{}", path_segment(schedule_id)))
}

/// `POST schedules`
#[must_use]
pub fn insert_schedule() -> Endpoint {
    Endpoint::post("schedules")
}

/// `PATCH schedules/{id}`
#[must_use]
pub fn update_schedule(schedule_id: impl Display) -> Endpoint {
    Endpoint::patch(format!("schedules/{}", path_segment(schedule_id)))
}

/// `DELETE schedules/{id}`
#[must_use]
pub fn remove_schedule(schedule_id: impl Display) -> Endpoint {
    Endpoint::delete(format!("schedules/{}", path_segment(schedule_id)))
}

// Available

/// `GET available`
#[must_use]
pub fn get_available() -> Endpoint {
    Endpoint::get("available")
}

/// `GET available?{filters}`
#[must_use]
pub fn filter_available(filters: &QueryParams) -> Endpoint {
    Endpoint::get(filters.append_to("available"))
}

// Assignments

/// `GET assignments?{filters}`
#[must_use]
pub fn filter_assignments(filters: &QueryParams) -> Endpoint {
    Endpoint::get(filters.append_to("assignments"))
}

/// `POST assignments`
#[must_use]
pub fn insert_assignment() -> Endpoint {
    Endpoint::post("assignments")
}

/// `PATCH assignments/{id}`
#[must_use]
pub fn update_assignment(assignment_id: impl Display) -> Endpoint {
    Endpoint::patch(format!("assignments/{}", path_segment(assignment_id)))
}

/// `GET assignments/active`
#[must_use]
pub fn get_active_assignments() -> Endpoint {
    Endpoint::get("assignments/active")
}

/// `GET assignments/active/{cloud_name}`
#[must_use]
pub fn get_active_cloud_assignment(cloud_name: &str) -> Endpoint {
    Endpoint::get(format!("assignments/active/{}", path_segment(cloud_name)))
}

/// `PATCH notifications/{id}`
#[must_use]
pub fn update_notification(notification_id: impl Display) -> Endpoint {
    Endpoint::patch(format!("notifications/{}", path_segment(notification_id)))
}

// Interfaces

/// `GET interfaces`
#[must_use]
pub fn get_interfaces() -> Endpoint {
    Endpoint::get("interfaces")
}

/// `GET hosts/{hostname}/interfaces`
#[must_use]
pub fn get_host_interface(hostname: &str) -> Endpoint {
    Endpoint::get(format!("hosts/{}/interfaces", path_segment(hostname)))
}

/// `POST interfaces/{hostname}`
#[must_use]
pub fn create_interface(hostname: &str) -> Endpoint {
    Endpoint::post(format!("interfaces/{}", path_segment(hostname)))
}

/// `PATCH interfaces/{hostname}`
#[must_use]
pub fn update_interface(hostname: &str) -> Endpoint {
    Endpoint::patch(format!("interfaces/{}", path_segment(hostname)))
}

/// `DELETE interfaces/{hostname}/{if_name}`
#[must_use]
pub fn remove_interface(hostname: &str, if_name: &str) -> Endpoint {
    Endpoint::delete(format!("interfaces/{}/{}", path_segment(hostname), path_segment(if_name)))
}

// Memory, disks, processors

/// `POST memory/{hostname}`
#[must_use]
pub fn create_memory(hostname: &str) -> Endpoint {
    Endpoint::post(format!("memory/{}", path_segment(hostname)))
}

/// `DELETE memory/{id}`
#[must_use]
pub fn remove_memory(memory_id: impl Display) -> Endpoint {
    Endpoint::delete(format!("memory/{}", path_segment(memory_id)))
}

/// `POST disks/{hostname}`
#[must_use]
pub fn create_disk(hostname: &str) -> Endpoint {
    Endpoint::post(format!("disks/{}", path_segment(hostname)))
}

/// `PATCH disks/{hostname}`
#[must_use]
pub fn update_disk(hostname: &str) -> Endpoint {
    Endpoint::patch(format!("disks/{}", path_segment(hostname)))
}

/// `DELETE disks/{hostname}/{id}`
#[must_use]
pub fn remove_disk(hostname: &str, disk_id: impl Display) -> Endpoint {
    Endpoint::delete(format!("disks/{}/{}", path_segment(hostname), path_segment(disk_id)))
}

/// `POST processors/{hostname}`
#[must_use]
pub fn create_processor(hostname: &str) -> Endpoint {
    Endpoint::post(format!("processors/{}", path_segment(hostname)))
}

/// `DELETE processors/{id}`
#[must_use]
pub fn remove_processor(processor_id: impl Display) -> Endpoint {
    Endpoint::delete(format!("processors/{}", path_segment(processor_id)))
}

// Vlans

/// `GET vlans`
#[must_use]
pub fn get_vlans() -> Endpoint {
    Endpoint::get("vlans")
}

/// `GET vlans/{id}`
#[must_use]
pub fn get_vlan(vlan_id: impl Display) -> Endpoint {
    Endpoint::get(format!("vlans/{}", path_segment(vlan_id)))
}

/// `POST vlans`
#[must_use]
pub fn create_vlan() -> Endpoint {
    Endpoint::post("vlans")
}

/// `PATCH vlans/{id}`
#[must_use]
pub fn update_vlan(vlan_id: impl Display) -> Endpoint {
    Endpoint::patch(format!("vlans/{}", path_segment(vlan_id)))
}

// Moves and version

/// `GET moves[?date={date}]`
#[must_use]
pub fn get_moves(date: Option<&str>) -> Endpoint {
    let mut params = QueryParams::new();
    params.push_opt("date", date);
    Endpoint::get(params.append_nonempty_to("moves"))
}

/// `GET version`
#[must_use]
pub fn get_version() -> Endpoint {
    Endpoint::get("version")
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Method;

    #[test]
    fn host_routes() {
        assert_eq!(get_hosts().path, "hosts");
        assert_eq!(get_host_models().path, "hosts?group_by=model");
        assert_eq!(get_host("host1.example.com").path, "hosts/host1.example.com");
        assert_eq!(create_host().method, Method::POST);
        assert_eq!(update_host("h1").method, Method::PATCH);
        assert_eq!(remove_host("h1"), Endpoint::delete("hosts/h1"));
    }

    #[test]
    fn filter_routes_always_carry_question_mark() {
        let empty = QueryParams::new();
        assert_eq!(filter_hosts(&empty).path, "hosts?");
        assert_eq!(filter_clouds(&empty).path, "clouds?");
        assert_eq!(filter_assignments(&empty).path, "assignments?");
        assert_eq!(filter_available(&empty).path, "available?");
        assert_eq!(is_available("h1", &empty).path, "available/h1?");
    }

    #[test]
    fn optional_filters_are_omitted_when_empty() {
        let empty = QueryParams::new();
        assert_eq!(get_summary(&empty).path, "clouds/summary");
        assert_eq!(get_schedules(&empty).path, "schedules");
        assert_eq!(get_current_schedules(&empty).path, "schedules/current");
        assert_eq!(get_future_schedules(&empty).path, "schedules/future");

        let filters = QueryParams::from([("cloud", "cloud02")]);
        assert_eq!(get_summary(&filters).path, "clouds/summary?cloud=cloud02");
        assert_eq!(
            get_current_schedules(&filters).path,
            "schedules/current?cloud=cloud02"
        );
    }

    #[test]
    fn filters_are_encoded() {
        let filters = QueryParams::from([("model", "m1"), ("name", "a b&c")]);
        assert_eq!(filter_hosts(&filters).path, "hosts?model=m1&name=a+b%26c");
    }

    #[test]
    fn get_cloud_encodes_name() {
        assert_eq!(get_cloud("cloud02").path, "clouds?name=cloud02");
        assert_eq!(get_cloud("my cloud").path, "clouds?name=my+cloud");
    }

    #[test]
    fn numeric_id_routes() {
        assert_eq!(get_schedule(42).path, "schedules/42");
        assert_eq!(update_schedule(42).method, Method::PATCH);
        assert_eq!(remove_schedule(42).path, "schedules/42");
        assert_eq!(update_assignment(7).path, "assignments/7");
        assert_eq!(update_notification(3).path, "notifications/3");
        assert_eq!(remove_memory(9).path, "memory/9");
        assert_eq!(remove_processor(11).path, "processors/11");
        assert_eq!(get_vlan(1120).path, "vlans/1120");
        assert_eq!(update_vlan(1120).path, "vlans/1120");
    }

    #[test]
    fn hardware_routes() {
        assert_eq!(create_interface("h1"), Endpoint::post("interfaces/h1"));
        assert_eq!(update_interface("h1"), Endpoint::patch("interfaces/h1"));
        assert_eq!(remove_interface("h1", "em1").path, "interfaces/h1/em1");
        assert_eq!(get_host_interface("h1").path, "hosts/h1/interfaces");
        assert_eq!(create_memory("h1").path, "memory/h1");
        assert_eq!(create_disk("h1").path, "disks/h1");
        assert_eq!(update_disk("h1").path, "disks/h1");
        assert_eq!(remove_disk("h1", 2).path, "disks/h1/2");
        assert_eq!(create_processor("h1").path, "processors/h1");
    }

    #[test]
    fn misc_routes() {
        assert_eq!(get_free_clouds().path, "clouds/free/");
        assert_eq!(get_active_assignments().path, "assignments/active");
        assert_eq!(
            get_active_cloud_assignment("cloud02").path,
            "assignments/active/cloud02"
        );
        assert_eq!(get_moves(None).path, "moves");
        assert_eq!(get_moves(Some("2024-01-01")).path, "moves?date=2024-01-01");
        assert_eq!(get_version().path, "version");
        assert_eq!(get_vlans().path, "vlans");
        assert_eq!(create_vlan().method, Method::POST);
    }

    #[test]
    fn names_are_single_segments() {
        assert_eq!(get_host("h1/../h2").path, "hosts/h1%2F..%2Fh2");
        assert_eq!(get_host("h1?cloud=cloud01").path, "hosts/h1%3Fcloud=cloud01");
        assert_eq!(get_host("h1#x").path, "hosts/h1%23x");
        assert_eq!(get_host("my host").path, "hosts/my%20host");
        assert_eq!(
            remove_interface("h1", "../../hosts/h1").path,
            "interfaces/h1/..%2F..%2Fhosts%2Fh1"
        );
        assert_eq!(
            remove_cloud("cloud02/../../hosts/h9").path,
            "clouds/cloud02%2F..%2F..%2Fhosts%2Fh9"
        );
        assert_eq!(
            get_active_cloud_assignment("c/1").path,
            "assignments/active/c%2F1"
        );
        assert_eq!(
            is_available("h 1", &QueryParams::from([("start", "x")])).path,
            "available/h%201?start=x"
        );
        assert_eq!(remove_host("..").path, "hosts/..");
    }
}
