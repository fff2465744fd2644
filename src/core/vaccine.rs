use crate::domain::model::{AllocationSummary, CenterDay, Individual, JabSite};
use crate::domain::ports::CenterLookup;
use crate::utils::error::{LabError, Result};
use chrono::NaiveDate;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::{BTreeMap, HashMap};
use std::io::{Read, Write};

const AT_RISK_PROBABILITY: f64 = 0.2;
const PRIOR_FIRST_JAB_PROBABILITY: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VaccinationPolicy {
    pub threshold_age: u32,
}

impl VaccinationPolicy {
    pub fn new(threshold_age: u32) -> Self {
        Self { threshold_age }
    }

    pub fn is_eligible(&self, individual: &Individual) -> bool {
        individual.age > self.threshold_age || individual.is_at_risk
    }
}

pub fn inject_first_jab(individual: &mut Individual, site: &JabSite) {
    individual.has_first_jab = true;
    individual.jab_location = Some(site.location.clone());
    individual.date_first_jab = Some(site.date);
}

pub fn inject_second_jab(individual: &mut Individual) {
    individual.has_second_jab = true;
}

/// 依序分配劑量，原地修改人口資料。
///
/// 只有符合資格且尚未完成兩劑的個體會消耗劑量。若輪到某個需要劑量的個體時
/// 已無剩餘劑量，回傳 `OutOfDoses`；在此之前已施打的紀錄保留不變。
pub fn apply_vaccine_to_population(
    population: &mut [Individual],
    doses: u32,
    policy: &VaccinationPolicy,
    site: &JabSite,
) -> Result<AllocationSummary> {
    let mut summary = AllocationSummary {
        remaining_doses: doses,
        ..Default::default()
    };

    for (position, individual) in population.iter_mut().enumerate() {
        if !policy.is_eligible(individual) {
            summary.skipped_ineligible += 1;
            continue;
        }
        if individual.is_fully_vaccinated() {
            summary.skipped_complete += 1;
            continue;
        }

        if summary.remaining_doses == 0 {
            tracing::warn!(
                "💉 Doses exhausted at individual #{} (id {})",
                position,
                individual.id
            );
            return Err(LabError::OutOfDoses {
                allocated: summary.first_doses + summary.second_doses,
                position,
            });
        }

        if individual.has_first_jab {
            inject_second_jab(individual);
            summary.second_doses += 1;
        } else {
            inject_first_jab(individual, site);
            summary.first_doses += 1;
        }
        summary.remaining_doses -= 1;
    }

    tracing::debug!(
        "💉 Allocation finished: {} first, {} second, {} doses left",
        summary.first_doses,
        summary.second_doses,
        summary.remaining_doses
    );
    Ok(summary)
}

pub fn generate_random_population<R: Rng>(
    n: usize,
    sites: &[JabSite],
    rng: &mut R,
) -> Vec<Individual> {
    (0..n)
        .map(|i| {
            let mut individual = Individual::new(
                i as u32,
                rng.gen_range(0..100),
                rng.gen_bool(AT_RISK_PROBABILITY),
            );
            if rng.gen_bool(PRIOR_FIRST_JAB_PROBABILITY) {
                if let Some(site) = sites.choose(&mut *rng) {
                    inject_first_jab(&mut individual, site);
                }
            }
            individual
        })
        .collect()
}

/// 依地點與日期索引的接種站資料
#[derive(Debug, Clone, Default)]
pub struct CenterDirectory {
    days: HashMap<(String, NaiveDate), CenterDay>,
}

impl CenterDirectory {
    pub fn new(days: impl IntoIterator<Item = CenterDay>) -> Self {
        let days = days
            .into_iter()
            .map(|day| ((day.location.clone(), day.date), day))
            .collect();
        Self { days }
    }

    /// CSV 欄位：location,date,vaccine_name
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let days = csv_reader
            .deserialize::<CenterDay>()
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self::new(days))
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// 所有接種站日期，依地點與日期排序
    pub fn sites(&self) -> Vec<JabSite> {
        let mut sites: Vec<JabSite> = self
            .days
            .keys()
            .map(|(location, date)| JabSite {
                location: location.clone(),
                date: *date,
            })
            .collect();
        sites.sort_by(|a, b| (&a.location, a.date).cmp(&(&b.location, b.date)));
        sites
    }
}

impl CenterLookup for CenterDirectory {
    fn center_day(&self, location: &str, date: NaiveDate) -> Option<&CenterDay> {
        self.days.get(&(location.to_string(), date))
    }
}

pub fn lookup_vaccine_name<L: CenterLookup + ?Sized>(
    individual: &Individual,
    lookup: &L,
) -> Result<Option<String>> {
    let (location, date) = match (&individual.jab_location, individual.date_first_jab) {
        (Some(location), Some(date)) if individual.has_first_jab => (location, date),
        _ => return Ok(None),
    };

    lookup
        .center_day(location, date)
        .map(|day| Some(day.vaccine_name.clone()))
        .ok_or_else(|| LabError::UnknownCenter {
            location: location.clone(),
            date: date.to_string(),
        })
}

/// 疫苗品牌 -> 施打人數
pub fn brand_histogram<L: CenterLookup + ?Sized>(
    population: &[Individual],
    lookup: &L,
) -> Result<BTreeMap<String, usize>> {
    let mut histogram = BTreeMap::new();
    for individual in population {
        if let Some(name) = lookup_vaccine_name(individual, lookup)? {
            *histogram.entry(name).or_insert(0) += 1;
        }
    }
    Ok(histogram)
}

pub fn read_population<R: Read>(reader: R) -> Result<Vec<Individual>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let population = csv_reader
        .deserialize::<Individual>()
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(population)
}

pub fn write_population<W: Write>(writer: W, population: &[Individual]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for individual in population {
        csv_writer.serialize(individual)?;
    }
    csv_writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn site() -> JabSite {
        JabSite {
            location: "north-hall".to_string(),
            date: NaiveDate::from_ymd_opt(2021, 3, 1).unwrap(),
        }
    }

    fn eligible_population(n: u32) -> Vec<Individual> {
        (0..n).map(|i| Individual::new(i, 80, false)).collect()
    }

    #[test]
    fn test_eligibility_uses_strict_age_or_risk() {
        let policy = VaccinationPolicy::new(70);
        assert!(!policy.is_eligible(&Individual::new(0, 70, false)));
        assert!(policy.is_eligible(&Individual::new(1, 71, false)));
        assert!(policy.is_eligible(&Individual::new(2, 20, true)));
    }

    #[test]
    fn test_out_of_doses_on_next_allocation() {
        let mut population = eligible_population(5);
        let err = apply_vaccine_to_population(&mut population, 3, &VaccinationPolicy::new(70), &site())
            .unwrap_err();

        match err {
            LabError::OutOfDoses {
                allocated,
                position,
            } => {
                assert_eq!(allocated, 3);
                assert_eq!(position, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
        // 已施打的紀錄保留
        assert!(population[..3].iter().all(|p| p.has_first_jab));
        assert!(population[3..].iter().all(|p| !p.has_first_jab));
    }

    #[test]
    fn test_enough_doses_completes() {
        let mut population = eligible_population(5);
        let summary =
            apply_vaccine_to_population(&mut population, 5, &VaccinationPolicy::new(70), &site())
                .unwrap();
        assert_eq!(summary.first_doses, 5);
        assert_eq!(summary.remaining_doses, 0);
    }

    #[test]
    fn test_second_jab_and_skips() {
        let mut population = vec![
            Individual::new(0, 30, false),
            Individual::new(1, 90, false),
            Individual::new(2, 90, false),
        ];
        inject_first_jab(&mut population[1], &site());
        inject_first_jab(&mut population[2], &site());
        inject_second_jab(&mut population[2]);

        let summary =
            apply_vaccine_to_population(&mut population, 1, &VaccinationPolicy::new(70), &site())
                .unwrap();

        assert_eq!(summary.skipped_ineligible, 1);
        assert_eq!(summary.skipped_complete, 1);
        assert_eq!(summary.second_doses, 1);
        assert!(population[1].has_second_jab);
        assert!(!population[0].has_first_jab);
    }

    #[test]
    fn test_random_population_is_seeded() {
        let sites = vec![site()];
        let a = generate_random_population(50, &sites, &mut StdRng::seed_from_u64(7));
        let b = generate_random_population(50, &sites, &mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
        assert!(a.iter().all(|p| p.age < 100));
        assert!(a
            .iter()
            .filter(|p| p.has_first_jab)
            .all(|p| p.jab_location.as_deref() == Some("north-hall")));
    }

    #[test]
    fn test_brand_histogram_counts_names() {
        let date = NaiveDate::from_ymd_opt(2021, 3, 1).unwrap();
        let directory = CenterDirectory::new(vec![
            CenterDay {
                location: "a".to_string(),
                date,
                vaccine_name: "pfizer".to_string(),
            },
            CenterDay {
                location: "b".to_string(),
                date,
                vaccine_name: "moderna".to_string(),
            },
        ]);
        let at = |location: &str| JabSite {
            location: location.to_string(),
            date,
        };

        let mut population: Vec<Individual> = (0..4).map(|i| Individual::new(i, 50, false)).collect();
        inject_first_jab(&mut population[0], &at("a"));
        inject_first_jab(&mut population[1], &at("a"));
        inject_first_jab(&mut population[2], &at("b"));

        let histogram = brand_histogram(&population, &directory).unwrap();
        assert_eq!(histogram.get("pfizer"), Some(&2));
        assert_eq!(histogram.get("moderna"), Some(&1));
        assert_eq!(histogram.len(), 2);
    }

    #[test]
    fn test_lookup_unknown_center_fails() {
        let directory = CenterDirectory::default();
        let mut individual = Individual::new(0, 50, false);
        assert_eq!(lookup_vaccine_name(&individual, &directory).unwrap(), None);

        inject_first_jab(&mut individual, &site());
        assert!(matches!(
            lookup_vaccine_name(&individual, &directory),
            Err(LabError::UnknownCenter { .. })
        ));
    }

    #[test]
    fn test_population_csv_round_trip_keeps_missing_fields() {
        let mut population = vec![Individual::new(0, 81, true), Individual::new(1, 12, false)];
        inject_first_jab(&mut population[0], &site());

        let mut buffer = Vec::new();
        write_population(&mut buffer, &population).unwrap();
        let parsed = read_population(buffer.as_slice()).unwrap();

        assert_eq!(parsed, population);
        assert_eq!(parsed[1].jab_location, None);
    }

    #[test]
    fn test_center_directory_from_csv() {
        let data = "location,date,vaccine_name\nnorth-hall,2021-03-01,pfizer\nsouth-hall,2021-03-02,astrazeneca\n";
        let directory = CenterDirectory::from_csv_reader(data.as_bytes()).unwrap();
        assert_eq!(directory.len(), 2);
        let day = directory
            .center_day("south-hall", NaiveDate::from_ymd_opt(2021, 3, 2).unwrap())
            .unwrap();
        assert_eq!(day.vaccine_name, "astrazeneca");
        assert_eq!(directory.sites()[0].location, "north-hall");
    }
}
