// 研究中心目录（内置示例数据）

use crate::models::ResearchCentre;

fn centre(
    id: u32,
    name: &str,
    location: &str,
    rating: f32,
    specialties: &[&str],
    active_trials: u32,
) -> ResearchCentre {
    ResearchCentre {
        id,
        name: name.to_string(),
        location: location.to_string(),
        rating,
        specialties: specialties.iter().map(|s| s.to_string()).collect(),
        active_trials,
    }
}

pub fn all_centres() -> Vec<ResearchCentre> {
    vec![
        centre(1, "Manhattan Medical Research", "New York, NY", 4.8, &["Cardiology", "Oncology", "Neurology"], 12),
        centre(2, "Boston Clinical Institute", "Boston, MA", 4.9, &["Diabetes", "Immunology", "Pediatrics"], 8),
        centre(3, "San Francisco Research Hub", "San Francisco, CA", 4.7, &["Mental Health", "Genetics", "Dermatology"], 15),
        centre(4, "Chicago Health Network", "Chicago, IL", 4.6, &["Orthopedics", "Gastroenterology"], 6),
        centre(5, "Miami Clinical Center", "Miami, FL", 4.8, &["Infectious Disease", "Pulmonology"], 10),
        centre(6, "Seattle Research Facility", "Seattle, WA", 4.9, &["Technology Medicine", "Bioengineering"], 9),
    ]
}

/// 按名称或地点搜索，不区分大小写；空查询返回全部
pub fn search_centres(query: &str) -> Vec<ResearchCentre> {
    let needle = query.trim().to_lowercase();
    all_centres()
        .into_iter()
        .filter(|c| {
            needle.is_empty()
                || c.name.to_lowercase().contains(&needle)
                || c.location.to_lowercase().contains(&needle)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_centres() {
        assert_eq!(search_centres("").len(), 6);
        assert_eq!(search_centres("  ").len(), 6);

        let boston = search_centres("boston");
        assert_eq!(boston.len(), 1);
        assert_eq!(boston[0].id, 2);

        let by_state = search_centres(", WA");
        assert_eq!(by_state[0].name, "Seattle Research Facility");

        assert!(search_centres("Denver").is_empty());
    }
}
