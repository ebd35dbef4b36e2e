use mokamon::aggregate::{
    aggregate_by_factory, aggregate_global, default_factories, DashboardView, FactoryDefinition,
    StatusCounts,
};
use mokamon::roster::{Machine, RosterSnapshot};
use mokamon::status::MachineStatus;

fn machine(key: &str, status: MachineStatus, location: Option<&str>) -> Machine {
    Machine {
        key: key.to_string(),
        name: key.to_string(),
        status,
        location: location.map(str::to_string),
        factory_id: None,
        error: None,
        last_update: None,
    }
}

#[test]
fn test_factory_without_machines_reports_zero() {
    let factories = vec![FactoryDefinition::new(1, "Italy"), FactoryDefinition::new(3, "Vietnam")];
    let roster = RosterSnapshot::new(vec![
        machine("a", MachineStatus::Operational, Some("Italy")),
        machine("b", MachineStatus::Alarm, Some("italy ")),
    ]);

    let aggregates = aggregate_by_factory(&roster, &factories);
    assert_eq!(aggregates.len(), 2);

    assert_eq!(aggregates[0].factory.name, "Italy");
    assert_eq!(aggregates[0].counts.operational, 1);
    assert_eq!(aggregates[0].counts.alarm, 1);
    assert_eq!(aggregates[0].counts.total(), 2);

    assert_eq!(aggregates[1].factory.name, "Vietnam");
    assert_eq!(aggregates[1].counts, StatusCounts::default());
}

struct Lcg(u64);

impl Lcg {
    fn next(&mut self, bound: u64) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (self.0 >> 33) % bound
    }
}

fn random_roster(rng: &mut Lcg) -> RosterSnapshot {
    let locations = [Some("Italy"), Some("Brasil"), Some("VIETNAM"), Some("Poland"), Some("2"), None];
    let machines = (0..rng.next(30))
        .map(|i| {
            let status = MachineStatus::ALL[rng.next(5) as usize];
            let location = locations[rng.next(locations.len() as u64) as usize];
            let mut m = machine(&format!("m{}", i), status, location);
            if rng.next(4) == 0 {
                m.factory_id = Some(1 + rng.next(4) as u32);
            }
            m
        })
        .collect();
    RosterSnapshot::new(machines)
}

#[test]
fn test_counts_sum_to_matched_machines() {
    let factories = default_factories();
    let mut rng = Lcg(42);

    for _ in 0..100 {
        let roster = random_roster(&mut rng);

        let global = aggregate_global(&roster);
        assert_eq!(global.total(), roster.len());

        for aggregate in aggregate_by_factory(&roster, &factories) {
            let matched = roster
                .machines
                .iter()
                .filter(|m| aggregate.factory.contains(m))
                .count();
            assert_eq!(aggregate.counts.total(), matched);
        }
    }
}

#[test]
fn test_aggregation_is_idempotent() {
    let factories = default_factories();
    let mut rng = Lcg(3);

    for _ in 0..50 {
        let roster = random_roster(&mut rng);
        assert_eq!(
            DashboardView::build(&roster, &factories),
            DashboardView::build(&roster, &factories)
        );
        assert_eq!(
            aggregate_by_factory(&roster, &factories),
            aggregate_by_factory(&roster, &factories)
        );
    }
}

#[test]
fn test_factory_order_follows_configuration() {
    let mut factories = default_factories();
    factories.reverse();
    let roster = RosterSnapshot::new(Vec::new());

    let names: Vec<String> = aggregate_by_factory(&roster, &factories)
        .into_iter()
        .map(|a| a.factory.name)
        .collect();
    assert_eq!(names, vec!["Vietnam", "Italy", "Brazil"]);
}
