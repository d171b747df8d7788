use uom::si::{
    f64::{TemperatureInterval, ThermodynamicTemperature},
    temperature_interval::kelvin as delta_kelvin,
    thermodynamic_temperature::kelvin as abs_kelvin,
};

/// Extension trait for computing temperature differences.
///
/// Subtracting two [`ThermodynamicTemperature`] values in [`uom`] does not
/// yield a [`TemperatureInterval`], see
/// [#380](https://github.com/iliekturtles/uom/issues/380).
pub trait TemperatureDifference {
    /// Returns the temperature difference `self - other`.
    fn minus(self, other: Self) -> TemperatureInterval;
}

impl TemperatureDifference for ThermodynamicTemperature {
    fn minus(self, other: Self) -> TemperatureInterval {
        TemperatureInterval::new::<delta_kelvin>(
            self.get::<abs_kelvin>() - other.get::<abs_kelvin>(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use uom::si::thermodynamic_temperature::degree_celsius;

    #[test]
    fn hotter_zone_gives_positive_difference() {
        let burned = ThermodynamicTemperature::new::<abs_kelvin>(2400.0);
        let crown = ThermodynamicTemperature::new::<abs_kelvin>(500.0);

        assert_relative_eq!(burned.minus(crown).get::<delta_kelvin>(), 1900.0);
        assert_relative_eq!(crown.minus(burned).get::<delta_kelvin>(), -1900.0);
    }

    #[test]
    fn mixed_scales() {
        let head = ThermodynamicTemperature::new::<degree_celsius>(126.85);
        let gas = ThermodynamicTemperature::new::<abs_kelvin>(400.0);

        assert_relative_eq!(gas.minus(head).get::<delta_kelvin>(), 0.0, epsilon = 1e-9);
    }
}
