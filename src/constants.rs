use anise::constants::SPEED_OF_LIGHT_KM_S;

/// Speed of light in m.s⁻¹
pub const SPEED_OF_LIGHT_M_S: f64 = SPEED_OF_LIGHT_KM_S * 1000.0;

/// Earth gravitational constant, as used by GPS broadcast orbits (m^3 s-2)
pub const EARTH_GRAVITATION_MU_M3_S2: f64 = 3.986005E14;

/// Earth angular velocity, in WGS84 frame rad/s
pub const EARTH_ANGULAR_VEL_RAD: f64 = 7.2921151467E-5;

/// Relativistic clock correction factor F = -2 sqrt(mu) / c² (s.m^-1/2)
pub const RELATIVISTIC_F: f64 = -4.442807633E-10;

/// Duration of one GPS week in seconds
pub const WEEK_SECONDS: f64 = 604800.0;

/// Half a GPS week in seconds, used in crossover checks
pub const HALF_WEEK_SECONDS: f64 = WEEK_SECONDS / 2.0;
