use std::f64::consts::PI;

const NEWTON_MAX_ITER: usize = 100;
const NEWTON_TOLERANCE: f64 = 1.0e-15;

/// Gauss–Legendre nodes and weights on `[-1, 1]`, nodes ascending.
#[derive(Debug, Clone, PartialEq)]
pub struct GaussLegendreRule {
    nodes: Vec<f64>,
    weights: Vec<f64>,
}

impl GaussLegendreRule {
    pub fn order(&self) -> usize {
        self.nodes.len()
    }

    pub fn nodes(&self) -> &[f64] {
        &self.nodes
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.nodes.iter().copied().zip(self.weights.iter().copied())
    }

    pub fn integrate(&self, integrand: impl Fn(f64) -> f64) -> f64 {
        self.points()
            .map(|(node, weight)| weight * integrand(node))
            .sum()
    }
}

/// Builds the `order`-point rule by Newton iteration on `P_order`, seeded with the
/// Tricomi estimate of each root.
pub fn gauss_legendre(order: usize) -> GaussLegendreRule {
    let mut nodes = vec![0.0; order];
    let mut weights = vec![0.0; order];
    let half = order.div_ceil(2);

    for index in 0..half {
        let mut root = (PI * (index as f64 + 0.75) / (order as f64 + 0.5)).cos();
        for _ in 0..NEWTON_MAX_ITER {
            let (value, slope) = legendre_with_derivative(order, root);
            let step = value / slope;
            root -= step;
            if step.abs() <= NEWTON_TOLERANCE {
                break;
            }
        }

        let (_, slope) = legendre_with_derivative(order, root);
        let weight = 2.0 / ((1.0 - root * root) * slope * slope);

        nodes[index] = -root;
        nodes[order - 1 - index] = root;
        weights[index] = weight;
        weights[order - 1 - index] = weight;
    }

    GaussLegendreRule { nodes, weights }
}

fn legendre_with_derivative(order: usize, x: f64) -> (f64, f64) {
    let mut previous = 1.0;
    let mut current = x;
    for degree in 1..order {
        let degree = degree as f64;
        let next = ((2.0 * degree + 1.0) * x * current - degree * previous) / (degree + 1.0);
        previous = current;
        current = next;
    }

    let slope = order as f64 * (x * current - previous) / (x * x - 1.0);
    (current, slope)
}

#[cfg(test)]
mod tests {
    use super::gauss_legendre;

    #[test]
    fn rule_has_requested_order_and_symmetric_ascending_nodes() {
        let rule = gauss_legendre(76);
        assert_eq!(rule.order(), 76);
        assert!(rule.nodes().windows(2).all(|pair| pair[0] < pair[1]));
        for index in 0..38 {
            assert_eq!(rule.nodes()[index], -rule.nodes()[75 - index]);
            assert_eq!(rule.weights()[index], rule.weights()[75 - index]);
        }
        assert!(rule.nodes().iter().all(|node| node.abs() < 1.0));
    }

    #[test]
    fn weights_sum_to_interval_length() {
        for order in [1, 2, 5, 20, 76] {
            let rule = gauss_legendre(order);
            let total: f64 = rule.weights().iter().sum();
            assert!((total - 2.0).abs() < 1.0e-13, "order {order}: {total}");
        }
    }

    #[test]
    fn integrates_high_degree_polynomials_exactly() {
        let rule = gauss_legendre(76);
        let quadratic = rule.integrate(|x| x * x);
        assert!((quadratic - 2.0 / 3.0).abs() < 1.0e-14);

        let degree_150 = rule.integrate(|x| x.powi(150));
        assert!((degree_150 - 2.0 / 151.0).abs() < 1.0e-14);

        let odd = rule.integrate(|x| x.powi(75));
        assert!(odd.abs() < 1.0e-15);
    }

    #[test]
    fn low_order_rules_match_closed_forms() {
        let two = gauss_legendre(2);
        let expected = 1.0 / 3.0_f64.sqrt();
        assert!((two.nodes()[0] + expected).abs() < 1.0e-15);
        assert!((two.nodes()[1] - expected).abs() < 1.0e-15);
        assert!((two.weights()[0] - 1.0).abs() < 1.0e-15);

        let three = gauss_legendre(3);
        assert!(three.nodes()[1].abs() < 1.0e-15);
        assert!((three.weights()[1] - 8.0 / 9.0).abs() < 1.0e-14);
    }
}
