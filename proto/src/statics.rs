// SPDX-License-Identifier: Apache-2.0
// Copyright Birdgen Authors

//! Static protocol section.

use crate::names::IpVersion;
use crate::pipe::Pipe;
use crate::plan::StaticRoute;
use crate::{BuildContext, Section};
use config::ConfigError;
use doc::ConfigDoc;
use ipnet::IpNet;
use std::net::IpAddr;
use tracing::debug;

#[derive(Debug, Default)]
pub struct StaticSection {
    routes: Vec<StaticRoute>,
    doc: ConfigDoc,
    configured: bool,
}

impl StaticSection {
    pub fn new(routes: Vec<StaticRoute>) -> Self {
        Self {
            routes,
            doc: ConfigDoc::new(),
            configured: false,
        }
    }

    fn route_line(route: &StaticRoute) -> Result<String, ConfigError> {
        if route.blackhole && route.nexthop.is_some() {
            return Err(ConfigError::InvalidInterface {
                interface: route.prefix.to_string(),
                reason: "static route cannot be both blackhole and via a nexthop".to_owned(),
            });
        }
        if route.blackhole {
            return Ok(format!("\troute {} blackhole;", route.prefix));
        }
        let nexthop = route.nexthop.ok_or_else(|| ConfigError::InvalidInterface {
            interface: route.prefix.to_string(),
            reason: "static route needs a nexthop or blackhole".to_owned(),
        })?;
        let matched = matches!(
            (&route.prefix, nexthop),
            (IpNet::V4(_), IpAddr::V4(_)) | (IpNet::V6(_), IpAddr::V6(_))
        );
        if !matched {
            return Err(ConfigError::InvalidInterface {
                interface: route.prefix.to_string(),
                reason: format!("nexthop {nexthop} does not match the prefix IP version"),
            });
        }
        Ok(format!("\troute {} via {nexthop};", route.prefix))
    }
}

impl Section for StaticSection {
    fn configure(&mut self, ctx: &mut BuildContext) -> Result<(), ConfigError> {
        if self.configured || self.routes.is_empty() {
            self.configured = true;
            return Ok(());
        }
        self.configured = true;
        debug!("configuring static section with {} routes", self.routes.len());

        self.doc.title("Static routes", 1);
        let mut versions = Vec::new();
        for version in IpVersion::BOTH {
            let routes: Vec<&StaticRoute> = self
                .routes
                .iter()
                .filter(|r| matches!(
                    (&r.prefix, version),
                    (IpNet::V4(_), IpVersion::V4) | (IpNet::V6(_), IpVersion::V6)
                ))
                .collect();
            if routes.is_empty() {
                continue;
            }
            versions.push(*version);
            let table = ctx.tables.declare("static", *version);
            self.doc
                .push(format!("protocol static static{} {{", version.suffix()));
            self.doc
                .push(format!("\t{} {{ table {table}; }};", version.channel()));
            for route in routes {
                self.doc.push(Self::route_line(route)?);
            }
            self.doc.push("};".to_owned());
            self.doc.push(String::new());
        }

        /* feed static routes into the master tables, only for the IP
         * versions that actually carry routes */
        self.doc
            .append(Pipe::new("static", "master").set_versions(&versions).render());
        Ok(())
    }

    fn doc(&self) -> &ConfigDoc {
        &self.doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{Globals, StateMap};
    use irr::{StaticIrr, StaticLimits};
    use std::str::FromStr;

    fn build(routes: Vec<StaticRoute>) -> Result<Vec<String>, ConfigError> {
        let globals = Globals::default();
        let previous = StateMap::new();
        let (irr, pdb) = (StaticIrr::new(), StaticLimits::new());
        let mut ctx = BuildContext::new(&globals, &previous, &irr, &pdb);
        let mut section = StaticSection::new(routes);
        section.configure(&mut ctx)?;
        Ok(section.doc().lines())
    }

    #[test]
    fn test_nexthop_and_blackhole_routes() {
        let lines = build(vec![
            StaticRoute {
                prefix: IpNet::from_str("10.0.0.0/24").expect("Bad prefix"),
                nexthop: Some(IpAddr::from_str("192.0.2.2").expect("Bad address")),
                blackhole: false,
            },
            StaticRoute {
                prefix: IpNet::from_str("10.0.1.0/24").expect("Bad prefix"),
                nexthop: None,
                blackhole: true,
            },
        ])
        .expect("configure");
        assert!(lines.contains(&"\troute 10.0.0.0/24 via 192.0.2.2;".to_owned()));
        assert!(lines.contains(&"\troute 10.0.1.0/24 blackhole;".to_owned()));
        /* v6 stanza and v6 pipe absent without v6 routes */
        assert!(!lines.iter().any(|l| l.contains("static6")));
        assert!(lines.contains(&"protocol pipe p_static_master4 {".to_owned()));
        assert!(!lines.iter().any(|l| l.contains("p_static_master6")));
    }

    #[test]
    fn test_version_mismatch_rejected() {
        let err = build(vec![StaticRoute {
            prefix: IpNet::from_str("2001:db8::/48").expect("Bad prefix"),
            nexthop: Some(IpAddr::from_str("192.0.2.2").expect("Bad address")),
            blackhole: false,
        }])
        .expect_err("must fail");
        assert!(matches!(err, ConfigError::InvalidInterface { .. }));
    }

    #[test]
    fn test_missing_nexthop_rejected() {
        let err = build(vec![StaticRoute {
            prefix: IpNet::from_str("10.0.0.0/24").expect("Bad prefix"),
            nexthop: None,
            blackhole: false,
        }])
        .expect_err("must fail");
        assert!(matches!(err, ConfigError::InvalidInterface { .. }));
    }
}
