use crate::tool::{Arguments, ParameterSchema, PropertySchema, Tool, ToolError};
use serde_json::{Value, json};

/// Basic arithmetic over two operands.
pub struct CalculatorTool;

impl CalculatorTool {
    fn operand(&self, args: &Arguments, key: &str) -> Result<f64, ToolError> {
        args.get(key)
            .and_then(Value::as_f64)
            .ok_or_else(|| ToolError::new(self.name(), format!("'{key}' must be a number")))
    }
}

impl Tool for CalculatorTool {
    fn name(&self) -> &str {
        "calculator"
    }

    fn description(&self) -> &str {
        "Performs basic arithmetic operations: add, subtract, multiply, divide"
    }

    fn parameters(&self) -> ParameterSchema {
        ParameterSchema::new()
            .required(
                "operation",
                PropertySchema::string()
                    .describe("The arithmetic operation to perform")
                    .one_of(["add", "subtract", "multiply", "divide"]),
            )
            .required("a", PropertySchema::number().describe("First operand"))
            .required("b", PropertySchema::number().describe("Second operand"))
    }

    fn execute(&self, args: &Arguments) -> Result<Value, ToolError> {
        let operation = args
            .get("operation")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::new(self.name(), "'operation' must be a string"))?;
        let a = self.operand(args, "a")?;
        let b = self.operand(args, "b")?;

        let result = match operation {
            "add" => a + b,
            "subtract" => a - b,
            "multiply" => a * b,
            "divide" => {
                if b == 0.0 {
                    return Err(ToolError::new(self.name(), "division by zero"));
                }
                a / b
            }
            other => {
                return Err(ToolError::new(self.name(), format!("unknown operation: {other}")));
            }
        };

        Ok(json!(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(operation: &str, a: f64, b: f64) -> Arguments {
        let mut args = Arguments::new();
        args.insert("operation".into(), json!(operation));
        args.insert("a".into(), json!(a));
        args.insert("b".into(), json!(b));
        args
    }

    #[test]
    fn four_operations() {
        let calc = CalculatorTool;
        assert_eq!(calc.execute(&args("add", 15.0, 27.0)).unwrap(), json!(42.0));
        assert_eq!(calc.execute(&args("subtract", 10.0, 4.0)).unwrap(), json!(6.0));
        assert_eq!(calc.execute(&args("multiply", 6.0, 7.0)).unwrap(), json!(42.0));
        assert_eq!(calc.execute(&args("divide", 9.0, 3.0)).unwrap(), json!(3.0));
    }

    #[test]
    fn division_by_zero_is_a_tool_error() {
        let err = CalculatorTool.execute(&args("divide", 1.0, 0.0)).unwrap_err();
        assert!(err.message.contains("division by zero"));
        assert_eq!(err.tool_name, "calculator");
    }

    #[test]
    fn schema_rejects_unknown_operation() {
        let err = CalculatorTool
            .parameters()
            .validate(&args("modulo", 1.0, 2.0))
            .unwrap_err();
        assert!(err.contains("operation"));
    }
}
